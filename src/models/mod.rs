pub mod concept;
pub mod enums;
pub mod episode;
pub mod person;
pub mod records;

pub use concept::*;
pub use enums::*;
pub use episode::*;
pub use person::*;
pub use records::*;
