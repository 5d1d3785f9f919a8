pub(crate) mod catalog;
pub(crate) mod chat;
pub(crate) mod profiles;
