pub mod command_reader;
pub mod stock_writer;
