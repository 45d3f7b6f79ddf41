mod object;

pub use object::{DocText, Member, Object, ObjectGraph, ObjectId, ObjectKind};
