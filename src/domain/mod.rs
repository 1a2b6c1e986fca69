//! Domain layer: the records the shop stores, the table schemas describing
//! how they are indexed, and the ports to external collaborators.

pub mod cart;
pub mod money;
pub mod ports;
pub mod product;
pub mod table;
