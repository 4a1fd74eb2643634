//! Download-tree discovery: path guard, sequential walker, sibling grouping.

pub mod guard;
pub mod siblings;
pub mod walker;
