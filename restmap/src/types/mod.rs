mod object;
pub use self::object::{Attributes, DataObject, Document, Entity, Record, PRIVATE_PREFIX};

mod page;
pub use self::page::Page;
