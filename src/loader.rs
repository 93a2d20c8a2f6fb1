//! Module loaders and the symbol resolution algorithm.

use std::sync::{ Arc, Weak };
use std::sync::atomic::{ AtomicBool, AtomicU64, Ordering };
use parking_lot::{ Mutex, RwLock };
use thiserror::Error ;
use tracing::{ debug, info, warn };

use crate::{ Artifact, ArtifactError, LoadError, ModuleRegistry, PluginMain, Symbol };
use crate::artifact::OpenArtifact ;
use crate::symbol_cache::{ Resolution, SymbolCache };

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new( 0 );



/// Errors that can occur when resolving a symbol.
#[derive( Debug, Error )]
pub enum ResolveError {
	/// No artifact on the search path defines the symbol, and neither does any
	/// loader consulted through fallback.
	#[error( "Symbol Not Found: {0}" )] NotFound( String ),
	/// The loader has been closed and no longer resolves anything.
	#[error( "Loader Closed" )] Closed,
	/// An artifact failed while being searched.
	#[error( "Artifact Error: {0}" )] Artifact( #[from] ArtifactError ),
}

#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub(crate) struct LoaderId( u64 );

impl std::fmt::Display for LoaderId {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "#{}", self.0 )}
}

pub(crate) enum LoaderScope {
	SelfResolving {
		search_path: RwLock<Vec<Arc<OpenArtifact>>>,
		cache: SymbolCache,
		/// Bumped whenever the search path grows.
		generation: AtomicU64,
	},
	Delegating {
		delegate: ModuleLoader,
		/// Artifacts this loader put on the delegate's path, withdrawn by `discard`
		attached: Mutex<Vec<Arc<OpenArtifact>>>,
	},
}

pub(crate) struct LoaderInner {
	id: LoaderId,
	scope: LoaderScope,
	registry: Arc<ModuleRegistry>,
	memberships: Mutex<Vec<Arc<ModuleRegistry>>>,
	closed: AtomicBool,
}

/// Owner of one plugin's symbol namespace.
///
/// A loader searches the artifacts on its own search path first and, when asked to,
/// falls back to every other live loader in its [`ModuleRegistry`]. Fallback is a
/// single hop: the loaders consulted are asked with fallback disabled, so resolution
/// always terminates after visiting each live loader at most once. The limit bounds
/// searching, not caching: a sibling never searches its own siblings on another
/// loader's behalf, but it does answer with whatever it already has cached, including
/// symbols it earlier resolved through its own fallback.
///
/// A loader may instead delegate entirely to another loader, in which case it never
/// searches on its own and any artifact added to it extends the delegate's path.
/// This lets several plugins share one namespace.
///
/// The handle is cheap to clone; all clones refer to the same loader. Call
/// [`ModuleLoader::close`] once the plugin is unloaded to release its artifacts.
#[derive( Clone )]
pub struct ModuleLoader( Arc<LoaderInner> );

impl ModuleLoader {

	/// Creates a self-resolving loader in the [global]( ModuleRegistry::global ) registry.
	pub fn new() -> Self { Self::in_registry( ModuleRegistry::global() ) }

	/// Creates a self-resolving loader that joins and falls back to `registry`.
	pub fn in_registry( registry: Arc<ModuleRegistry> ) -> Self {
		Self::create( registry, LoaderScope::SelfResolving {
			search_path: RwLock::new( Vec::new() ),
			cache: SymbolCache::new(),
			generation: AtomicU64::new( 0 ),
		})
	}

	/// Creates a loader that forwards all resolution to `delegate`. It joins the
	/// delegate's home registry.
	pub fn delegating( delegate: ModuleLoader ) -> Self {
		let registry = Arc::clone( &delegate.0.registry );
		Self::delegating_in( registry, delegate )
	}

	/// Creates a loader in `registry` that forwards all resolution to `delegate`.
	pub fn delegating_in( registry: Arc<ModuleRegistry>, delegate: ModuleLoader ) -> Self {
		Self::create( registry, LoaderScope::Delegating { delegate, attached: Mutex::new( Vec::with_capacity( 1 )) })
	}

	fn create( registry: Arc<ModuleRegistry>, scope: LoaderScope ) -> Self {
		let loader = Self( Arc::new( LoaderInner {
			id: LoaderId( NEXT_LOADER_ID.fetch_add( 1, Ordering::Relaxed )),
			scope,
			registry: Arc::clone( &registry ),
			memberships: Mutex::new( Vec::with_capacity( 1 )),
			closed: AtomicBool::new( false ),
		}));
		registry.register( &loader );
		debug!( loader = %loader.id(), delegate = ?loader.delegate().map( ModuleLoader::id ), "created module loader" );
		loader
	}

	#[inline] pub(crate) fn id( &self ) -> LoaderId { self.0.id }

	#[inline] pub(crate) fn downgrade( &self ) -> Weak<LoaderInner> { Arc::downgrade( &self.0 ) }

	#[inline] pub(crate) fn from_inner( inner: Arc<LoaderInner> ) -> Self { Self( inner ) }

	pub(crate) fn remember_membership( &self, registry: &Arc<ModuleRegistry> ) {
		let mut memberships = self.0.memberships.lock();
		if !memberships.iter().any(| member | Arc::ptr_eq( member, registry )) {
			memberships.push( Arc::clone( registry ));
		}
	}

	/// Whether [`ModuleLoader::close`] has been called.
	#[inline] pub fn is_closed( &self ) -> bool { self.0.closed.load( Ordering::Acquire ) }

	/// The registry this loader joined on creation and falls back to.
	#[inline] pub fn registry( &self ) -> &Arc<ModuleRegistry> { &self.0.registry }

	/// The loader this one forwards to, if any.
	pub fn delegate( &self ) -> Option<&ModuleLoader> {
		match &self.0.scope {
			LoaderScope::Delegating { delegate, .. } => Some( delegate ),
			LoaderScope::SelfResolving { .. } => None,
		}
	}

	/// Locations of the artifacts this loader searches, in search order.
	pub fn search_path( &self ) -> Vec<String> {
		match &self.0.scope {
			LoaderScope::Delegating { delegate, .. } => delegate.search_path(),
			LoaderScope::SelfResolving { search_path, .. } => search_path.read().iter()
				.map(| artifact | artifact.location().to_string() )
				.collect(),
		}
	}

	/// Appends `artifact` to the search path, or to the delegate's search path.
	///
	/// # Errors
	/// Returns [`ResolveError::Closed`] if the loader (or its delegate) is closed.
	pub fn add_artifact( &self, artifact: Arc<dyn Artifact> ) -> Result<(), ResolveError> {
		self.attach( artifact ).map(|_| ())
	}

	fn attach( &self, artifact: Arc<dyn Artifact> ) -> Result<Arc<OpenArtifact>, ResolveError> {
		let ( search_path, cache, generation ) = match &self.0.scope {
			LoaderScope::Delegating { delegate, attached } => {
				let mut attached = attached.lock();
				// Checked under the lock so discard() cannot miss an artifact attached here
				if self.is_closed() { return Err( ResolveError::Closed ) }
				let open = delegate.attach( artifact )?;
				attached.push( Arc::clone( &open ));
				return Ok( open );
			},
			LoaderScope::SelfResolving { search_path, cache, generation } => ( search_path, cache, generation ),
		};
		let mut path = search_path.write();
		// Checked under the lock so close() cannot miss an artifact pushed here
		if self.is_closed() { return Err( ResolveError::Closed ) }
		debug!( loader = %self.id(), artifact = artifact.location(), "extending search path" );
		let open = Arc::new( OpenArtifact::new( artifact ));
		path.push( Arc::clone( &open ));
		generation.fetch_add( 1, Ordering::AcqRel );
		cache.purge_missing();
		Ok( open )
	}

	/// Takes `artifact` off the search path it was attached to and releases it.
	/// Symbols it defined stop being served by every cache holding them.
	fn detach( &self, artifact: &Arc<OpenArtifact> ) -> Result<(), ArtifactError> {
		match &self.0.scope {
			LoaderScope::Delegating { delegate, .. } => delegate.detach( artifact ),
			LoaderScope::SelfResolving { search_path, .. } => {
				search_path.write().retain(| entry | !Arc::ptr_eq( entry, artifact ));
				debug!( loader = %self.id(), artifact = artifact.location(), "withdrew artifact" );
				artifact.close()
			},
		}
	}

	/// Resolves `name`.
	///
	/// Searches the cache, then the loader's own search path, then (when
	/// `allow_fallback` is set) every other live loader in the registry with
	/// fallback disabled. The first hit is cached on this loader. A miss after a
	/// full search is cached too, until the search path next grows.
	///
	/// # Errors
	/// - [`ResolveError::Closed`] once the loader has been closed
	/// - [`ResolveError::NotFound`] if nothing defines `name`
	/// - [`ResolveError::Artifact`] if an artifact on this loader's own path fails
	pub fn find_symbol( &self, name: &str, allow_fallback: bool ) -> Result<Symbol, ResolveError> {

		if self.is_closed() { return Err( ResolveError::Closed ) }

		let ( search_path, cache, generation ) = match &self.0.scope {
			LoaderScope::Delegating { delegate, .. } => return delegate.find_symbol( name, allow_fallback ),
			LoaderScope::SelfResolving { search_path, cache, generation } => ( search_path, cache, generation ),
		};

		match cache.lookup( name ) {
			Some( Resolution::Found( symbol )) => return Ok( symbol ),
			Some( Resolution::Missing ) => return Err( ResolveError::NotFound( name.to_string() )),
			None => {},
		}

		let searched_generation = generation.load( Ordering::Acquire );
		if let Some( symbol ) = Self::find_local( search_path, name )? {
			return Ok( cache.insert_found( name, symbol ));
		}

		if !allow_fallback { return Err( ResolveError::NotFound( name.to_string() )) }

		match self.find_in_others( name ) {
			Some( symbol ) => {
				debug!( loader = %self.id(), symbol = name, location = symbol.location(), "resolved through fallback" );
				Ok( cache.insert_found( name, symbol ))
			},
			None => {
				if generation.load( Ordering::Acquire ) == searched_generation { cache.insert_missing( name ) }
				Err( ResolveError::NotFound( name.to_string() ))
			},
		}

	}

	fn find_local( search_path: &RwLock<Vec<Arc<OpenArtifact>>>, name: &str ) -> Result<Option<Symbol>, ResolveError> {
		search_path.read().iter()
			.find_map(| artifact | artifact.define( name )
				.transpose()
				.map(| definition | definition.map(| definition | Symbol::bind( name, definition, artifact )))
			)
			.transpose()
			.map_err( ResolveError::from )
	}

	fn find_in_others( &self, name: &str ) -> Option<Symbol> {
		self.0.registry.others( self ).find_map(| peer | match peer.find_symbol( name, false ) {
			Ok( symbol ) => Some( symbol ),
			Err( ResolveError::NotFound( _ ) | ResolveError::Closed ) => None,
			Err( err ) => {
				warn!( loader = %self.id(), peer = %peer.id(), symbol = name, error = %err, "skipping loader during fallback" );
				None
			},
		})
	}

	/// Returns the live symbol already loaded under `name`, without searching.
	pub fn find_loaded( &self, name: &str ) -> Option<Symbol> {
		if self.is_closed() { return None }
		match &self.0.scope {
			LoaderScope::Delegating { delegate, .. } => delegate.find_loaded( name ),
			LoaderScope::SelfResolving { cache, .. } => cache.loaded( name ),
		}
	}

	/// Whether `name` is already loaded by this loader or by any other live loader
	/// in its registry. Nothing is searched.
	pub fn is_defined( &self, name: &str ) -> bool {
		self.find_loaded( name ).is_some()
			|| self.0.registry.others( self ).any(| peer | peer.find_loaded( name ).is_some() )
	}

	/// Looks up a plugin's main symbol in `artifact`.
	///
	/// The artifact is appended to the search path (or the delegate's) and the
	/// symbol is resolved with fallback. It must satisfy the plugin contract and
	/// expose exactly one constructor. If it does not, a delegating loader takes the
	/// artifact back off its delegate's path.
	///
	/// # Errors
	/// - [`LoadError::DuplicateDefinition`] if `main` is already loaded anywhere in the registry
	/// - [`LoadError::NotFound`] if the symbol cannot be resolved
	/// - [`LoadError::NotAPlugin`] if the symbol does not satisfy the plugin contract
	/// - [`LoadError::AmbiguousConstructor`] unless there is exactly one constructor
	/// - [`LoadError::Closed`] if the loader is closed
	pub fn lookup_main( &self, main: &str, artifact: Arc<dyn Artifact> ) -> Result<PluginMain, LoadError> {
		if self.is_closed() { return Err( LoadError::Closed ) }
		if self.is_defined( main ) { return Err( LoadError::DuplicateDefinition( main.to_string() )) }
		let attached = self.attach( artifact )?;
		let found = self.find_symbol( main, true )
			.map_err( LoadError::from )
			.and_then( PluginMain::from_symbol );
		if found.is_err() && self.delegate().is_some() {
			if let Err( err ) = self.detach( &attached ) {
				warn!( loader = %self.id(), error = %err, "failed to withdraw artifact from delegate" );
			}
		}
		found
	}

	/// Unregisters the loader from every registry it joined, then releases the
	/// artifacts on its search path. Idempotent.
	///
	/// A delegating loader releases nothing; the delegate still owns the artifacts.
	/// See [`ModuleLoader::discard`] to take them back.
	///
	/// # Errors
	/// Returns the first error reported while releasing an artifact. Every artifact
	/// is released regardless.
	pub fn close( &self ) -> Result<(), ArtifactError> {

		if self.0.closed.swap( true, Ordering::AcqRel ) { return Ok(()) }

		let registries = std::mem::take( &mut *self.0.memberships.lock() );
		registries.iter().for_each(| registry | registry.remove( self.id() ));

		let LoaderScope::SelfResolving { search_path, cache, .. } = &self.0.scope else {
			debug!( loader = %self.id(), "closed delegating module loader" );
			return Ok(())
		};

		let released = std::mem::take( &mut *search_path.write() );
		cache.clear();
		info!( loader = %self.id(), artifacts = released.len(), "closed module loader" );

		released.iter().fold( Ok(()), | result, artifact | {
			let closed = artifact.close();
			result.and( closed )
		})

	}

	/// Closes the loader, then withdraws and releases every artifact it attached to
	/// its delegate, so a failed load leaves nothing on a shared path. For a
	/// self-resolving loader this is [`ModuleLoader::close`].
	///
	/// # Errors
	/// Returns the first error reported while releasing an artifact.
	pub fn discard( &self ) -> Result<(), ArtifactError> {
		let closed = self.close();
		let LoaderScope::Delegating { attached, .. } = &self.0.scope else { return closed };
		let withdrawn = std::mem::take( &mut *attached.lock() );
		withdrawn.iter().fold( closed, | result, artifact | {
			let detached = self.detach( artifact );
			result.and( detached )
		})
	}

}

impl Default for ModuleLoader {
	fn default() -> Self { Self::new() }
}

impl PartialEq for ModuleLoader {
	fn eq( &self, other: &Self ) -> bool { Arc::ptr_eq( &self.0, &other.0 ) }
}
impl Eq for ModuleLoader {}

impl std::fmt::Debug for ModuleLoader {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ModuleLoader" )
			.field( "id", &self.id() )
			.field( "closed", &self.is_closed() )
			.field( "delegate", &self.delegate().map( ModuleLoader::id ))
			.field( "search_path", &self.search_path() )
			.finish()
	}
}

impl Drop for LoaderInner {
	fn drop( &mut self ) {
		let id = self.id ;
		self.memberships.get_mut().iter().for_each(| registry | registry.remove( id ));
		if let LoaderScope::SelfResolving { search_path, .. } = &mut self.scope {
			// Nothing left to report errors to
			search_path.get_mut().iter().for_each(| artifact | { let _ = artifact.close(); });
		}
	}
}

#[cfg( test )]
mod tests {
	use std::sync::Arc ;
	use super::{ ModuleLoader, ResolveError };
	use crate::{ ModuleRegistry, NativeBundle };

	#[test]
	fn closed_loader_refuses_new_artifacts() {
		let loader = ModuleLoader::in_registry( ModuleRegistry::new() );
		loader.close().unwrap();
		let result = loader.add_artifact( Arc::new( NativeBundle::new( "file:///late.bundle" )));
		assert!( matches!( result, Err( ResolveError::Closed )));
	}

	#[test]
	fn close_is_idempotent() {
		let registry = ModuleRegistry::new();
		let loader = ModuleLoader::in_registry( Arc::clone( &registry ));
		loader.close().unwrap();
		loader.close().unwrap();
		assert!( registry.is_empty() );
	}

	#[test]
	fn dropping_last_handle_leaves_registry() {
		let registry = ModuleRegistry::new();
		let loader = ModuleLoader::in_registry( Arc::clone( &registry ));
		assert_eq!( registry.len(), 1 );
		drop( loader );
		assert!( registry.is_empty() );
	}

	#[test]
	fn search_path_grows_in_order() {
		let loader = ModuleLoader::in_registry( ModuleRegistry::new() );
		loader.add_artifact( Arc::new( NativeBundle::new( "file:///first.bundle" ))).unwrap();
		loader.add_artifact( Arc::new( NativeBundle::new( "file:///second.bundle" ))).unwrap();
		assert_eq!( loader.search_path(), vec![ "file:///first.bundle", "file:///second.bundle" ]);
	}
}
