//! The set of live loaders consulted during fallback resolution.

use std::sync::{ Arc, Weak };
use dashmap::DashMap ;
use itertools::Itertools ;
use once_cell::sync::Lazy ;

use crate::loader::{ LoaderId, LoaderInner, ModuleLoader };

static GLOBAL: Lazy<Arc<ModuleRegistry>> = Lazy::new( ModuleRegistry::new );



/// A weakly-held set of [`ModuleLoader`]s.
///
/// Membership never keeps a loader alive: entries whose loader has been dropped
/// are skipped during iteration, and closing a loader removes it from every
/// registry it joined. Iteration works on a snapshot, so a loader being closed
/// concurrently is either seen whole or not at all.
///
/// [`ModuleRegistry::global`] is the process-wide registry loaders join by default.
/// Separate registries isolate groups of plugins from each other's fallback.
#[derive( Debug, Default )]
pub struct ModuleRegistry {
	members: DashMap<LoaderId, Weak<LoaderInner>>,
}

impl ModuleRegistry {

	/// Creates an empty, independent registry.
	pub fn new() -> Arc<Self> { Arc::new( Self::default() ) }

	/// The process-wide registry.
	pub fn global() -> Arc<Self> { Arc::clone( &GLOBAL ) }

	/// Adds `loader` to this registry. Closed loaders are not admitted.
	///
	/// Loaders join their home registry on creation; call this to make a loader
	/// visible to the fallback of another registry as well.
	pub fn register( self: &Arc<Self>, loader: &ModuleLoader ) {
		if loader.is_closed() { return }
		self.members.insert( loader.id(), loader.downgrade() );
		loader.remember_membership( self );
		// Lost a race with close(); undo so no closed loader lingers
		if loader.is_closed() { self.remove( loader.id() ) }
	}

	/// Removes `loader`. Idempotent.
	pub fn unregister( &self, loader: &ModuleLoader ) {
		self.remove( loader.id() );
	}

	pub(crate) fn remove( &self, id: LoaderId ) {
		self.members.remove( &id );
	}

	/// Whether `loader` is currently a member.
	pub fn contains( &self, loader: &ModuleLoader ) -> bool {
		self.members.get( &loader.id() ).is_some_and(| entry | entry.strong_count() > 0 )
	}

	/// Every live member except `asking`, in unspecified order.
	pub fn others( &self, asking: &ModuleLoader ) -> impl Iterator<Item = ModuleLoader> {
		let asking = asking.id();
		self.members.iter()
			.filter(| entry | *entry.key() != asking )
			.map(| entry | entry.value().clone() )
			.collect_vec()
			.into_iter()
			.filter_map(| weak | weak.upgrade().map( ModuleLoader::from_inner ))
	}

	/// Calls `f` with every live member except `asking`.
	pub fn for_each_other( &self, asking: &ModuleLoader, f: impl FnMut( ModuleLoader )) {
		self.others( asking ).for_each( f );
	}

	/// Number of live members.
	pub fn len( &self ) -> usize {
		self.members.iter().filter(| entry | entry.strong_count() > 0 ).count()
	}

	pub fn is_empty( &self ) -> bool { self.len() == 0 }

}
