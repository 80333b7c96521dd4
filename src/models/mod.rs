pub mod aspects;
pub mod birth;
pub mod outcome;
pub mod subject;
pub mod zodiac;

pub use aspects::*;
pub use birth::*;
pub use outcome::*;
pub use subject::*;
pub use zodiac::*;
