use crate::domain::product::Product;
use crate::error::{Result, ShopError};
use crate::infrastructure::repositories::ProductRepository;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedFormat {
    /// A JSON array of products.
    Json,
    /// CSV with header `id,name,price,stock`.
    Csv,
}

impl SeedFormat {
    /// `.json` files are JSON, anything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SeedFormat::Json,
            _ => SeedFormat::Csv,
        }
    }
}

/// Parses and validates seed products. Any bad record fails the whole seed.
pub fn read_products<R: Read>(source: R, format: SeedFormat) -> Result<Vec<Product>> {
    let products: Vec<Product> = match format {
        SeedFormat::Json => serde_json::from_reader(source)?,
        SeedFormat::Csv => csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source)
            .into_deserialize()
            .collect::<std::result::Result<_, _>>()?,
    };
    products.iter().try_for_each(Product::validate)?;
    Ok(products)
}

/// Loads the seed file at `path` into the products table as one batch.
pub async fn load_products(path: &Path, products: &ProductRepository) -> Result<usize> {
    let file = File::open(path).map_err(|err| {
        ShopError::IoError(std::io::Error::new(
            err.kind(),
            format!("could not open seed file {}: {err}", path.display()),
        ))
    })?;
    let seed = read_products(BufReader::new(file), SeedFormat::from_path(path))?;
    products.put(&seed).await?;
    tracing::info!(path = %path.display(), products = seed.len(), "loaded product seeds");
    Ok(seed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_from_path() {
        assert_eq!(SeedFormat::from_path(Path::new("data/products.json")), SeedFormat::Json);
        assert_eq!(SeedFormat::from_path(Path::new("data/products.JSON")), SeedFormat::Json);
        assert_eq!(SeedFormat::from_path(Path::new("data/products.csv")), SeedFormat::Csv);
        assert_eq!(SeedFormat::from_path(Path::new("products")), SeedFormat::Csv);
    }

    #[test]
    fn test_read_json_products() {
        let data = r#"[
            {"id": 1, "name": "widget", "price": 100, "stock": 3},
            {"id": 2, "name": "gadget", "price": "2.50", "stock": 10}
        ]"#;
        let products = read_products(data.as_bytes(), SeedFormat::Json).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Money::new(dec!(100)).unwrap());
        assert_eq!(products[1].price, Money::new(dec!(2.5)).unwrap());
    }

    #[test]
    fn test_read_csv_products() {
        let data = "id, name, price, stock\n1, widget, 100, 3\n2, gadget, 2.5, 10";
        let products = read_products(data.as_bytes(), SeedFormat::Csv).unwrap();
        assert_eq!(products[1], Product::new(2, "gadget", Money::new(dec!(2.5)).unwrap(), 10));
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let zero_id = r#"[{"id": 0, "name": "ghost", "price": 1, "stock": 1}]"#;
        assert!(matches!(
            read_products(zero_id.as_bytes(), SeedFormat::Json),
            Err(ShopError::ValidationError(_))
        ));

        let negative_stock = "id,name,price,stock\n1,widget,1,-3";
        assert!(matches!(
            read_products(negative_stock.as_bytes(), SeedFormat::Csv),
            Err(ShopError::CsvError(_))
        ));

        let negative_price = r#"[{"id": 1, "name": "widget", "price": -1, "stock": 1}]"#;
        assert!(matches!(
            read_products(negative_price.as_bytes(), SeedFormat::Json),
            Err(ShopError::JsonError(_))
        ));
    }
}
