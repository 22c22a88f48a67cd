pub mod recordform;
pub mod recordlist;
