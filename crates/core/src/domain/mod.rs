pub mod customer;
pub mod order;
pub mod outlet;
pub mod service;
