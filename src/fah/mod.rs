pub mod allocate;
pub mod collection;
pub mod compare;
pub mod config;
pub mod copy;
pub mod index;
pub mod layout;
pub mod managed;
pub mod record;
pub mod sync;
