use crate::domain::product::{Product, ProductId};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct StockRow<'a> {
    id: ProductId,
    name: &'a str,
    price: String,
    stock: u32,
}

/// Writes the stock table as CSV: `id,name,price,stock`.
pub struct StockWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StockWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_products(&mut self, products: &[Product]) -> Result<()> {
        if products.is_empty() {
            self.writer.write_record(["id", "name", "price", "stock"])?;
        }
        for product in products {
            self.writer.serialize(StockRow {
                id: product.id,
                name: &product.name,
                price: product.price.to_string(),
                stock: product.stock,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
