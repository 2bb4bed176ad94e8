pub mod controls;
pub mod datatable;
pub mod debug;
pub mod pie;
pub mod sidebar;
