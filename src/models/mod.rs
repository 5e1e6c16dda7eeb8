pub mod cro;
