use crate::domain::product::ProductId;
use crate::error::{Result, ShopError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Add,
    Checkout,
}

/// One row of a shop command script.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ShopCommand {
    pub op: CommandType,
    pub owner: String,
    pub product: Option<ProductId>,
    pub quantity: Option<u32>,
}

impl ShopCommand {
    /// Product and quantity of an `add` row.
    pub fn item(&self) -> Result<(ProductId, u32)> {
        match (self.product, self.quantity) {
            (Some(product), Some(quantity)) => Ok((product, quantity)),
            _ => Err(ShopError::ValidationError(format!(
                "add for {} needs both a product and a quantity",
                self.owner
            ))),
        }
    }
}

/// Reads shop commands from a CSV source with header
/// `op, owner, product, quantity`.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes commands; a malformed row yields an error and the
    /// iterator carries on with the next one.
    pub fn commands(self) -> impl Iterator<Item = Result<ShopCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ShopError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, owner, product, quantity\nadd, alice, 1, 2\ncheckout, alice, , ";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<ShopCommand>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        let add = results[0].as_ref().unwrap();
        assert_eq!(add.op, CommandType::Add);
        assert_eq!(add.item().unwrap(), (1, 2));

        let checkout = results[1].as_ref().unwrap();
        assert_eq!(checkout.op, CommandType::Checkout);
        assert_eq!(checkout.owner, "alice");
        assert_eq!(checkout.product, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "op, owner, product, quantity\nremove, alice, 1, 1\nadd, bob, x, 1\nadd, bob, 1, 1";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<ShopCommand>> = reader.commands().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_add_without_quantity() {
        let data = "op, owner, product, quantity\nadd, bob, 1, ";
        let command = CommandReader::new(data.as_bytes())
            .commands()
            .next()
            .unwrap()
            .unwrap();
        assert!(matches!(command.item(), Err(ShopError::ValidationError(_))));
    }
}
