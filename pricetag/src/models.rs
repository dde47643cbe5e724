use strum::Display;

mod cart;
mod customer;
mod tag;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Tag,
    Customer,
    Address,
    Cart,
}

pub use cart::*;
pub use customer::*;
pub use tag::*;
