pub mod intset;
pub mod lzf;
pub mod utils;
pub mod ziplist;
pub mod zipmap;
