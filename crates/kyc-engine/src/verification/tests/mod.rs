mod common;
mod fraud;
