//! Registry of known fathers and children, and the inbound origin gate.

use crate::transport::FrameHandle;

use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A parent window target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Father {
	/// Target origin for posts, also the origin accepted from it.
	pub uri: String,
	pub name: String,
}

/// An embedded frame target.
///
/// The frame's origin is never cached: [`Child::src`] reads it from the
/// handle every time, since the frame may navigate during its lifetime.
#[derive(Clone)]
pub struct Child {
	pub frame: Arc<dyn FrameHandle>,
	pub name: String,
}

impl Child {
	pub fn src(&self) -> Option<String> {
		self.frame.src()
	}
}

impl fmt::Debug for Child {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Child")
			.field("name", &self.name)
			.field("src", &self.src())
			.finish()
	}
}

/// Ordered lists of fathers and children. Lists only grow.
///
/// Duplicate names or origins are accepted; lookups return the first match.
#[derive(Debug, Default)]
pub struct Registry {
	fathers: Vec<Father>,
	children: Vec<Child>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_father(&mut self, uri: impl Into<String>, name: impl Into<String>) {
		let father = Father {
			uri: uri.into(),
			name: name.into(),
		};
		if self.father_by_name(&father.name).is_some() {
			warn!("Father name '{}' already registered, lookups keep the first entry", father.name);
		}
		self.fathers.push(father);
	}

	pub fn add_child(&mut self, frame: Arc<dyn FrameHandle>, name: impl Into<String>) {
		let child = Child {
			frame,
			name: name.into(),
		};
		if self.child_by_name(&child.name).is_some() {
			warn!("Child name '{}' already registered, lookups keep the first entry", child.name);
		}
		self.children.push(child);
	}

	pub fn fathers(&self) -> &[Father] {
		&self.fathers
	}

	pub fn children(&self) -> &[Child] {
		&self.children
	}

	pub fn father_by_name(&self, name: &str) -> Option<&Father> {
		self.fathers.iter().find(|father| father.name == name)
	}

	pub fn father_by_origin(&self, origin: &str) -> Option<&Father> {
		self.fathers.iter().find(|father| father.uri == origin)
	}

	pub fn child_by_name(&self, name: &str) -> Option<&Child> {
		self.children.iter().find(|child| child.name == name)
	}

	pub fn child_by_origin(&self, origin: &str) -> Option<&Child> {
		self.children
			.iter()
			.find(|child| child.src().as_deref() == Some(origin))
	}

	/// True iff `origin` belongs to a registered father or to a child's current `src`.
	pub fn is_correct_origin(&self, origin: &str) -> bool {
		self.father_by_origin(origin).is_some() || self.child_by_origin(origin).is_some()
	}

	pub fn clear(&mut self) {
		self.fathers.clear();
		self.children.clear();
	}
}
