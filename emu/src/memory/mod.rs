pub mod memory_map;
