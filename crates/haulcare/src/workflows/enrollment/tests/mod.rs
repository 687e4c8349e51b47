mod common;
mod service;
mod store;
mod wizard;
