pub mod db;
pub mod entities;
pub mod retry;
