use dashmap::DashMap ;
use dashmap::mapref::entry::Entry ;

use crate::Symbol ;



/// A memoized resolution outcome.
#[derive( Debug, Clone )]
pub(crate) enum Resolution {
	Found( Symbol ),
	/// Recorded only after a full search including fallback.
	Missing,
}

/// Per-loader memo of name to resolution results.
///
/// Concurrent resolutions of the same name may both do the search work; the
/// first `Found` to land wins and every caller gets that one back.
#[derive( Debug, Default )]
pub(crate) struct SymbolCache {
	entries: DashMap<String, Resolution>,
}

impl SymbolCache {

	pub fn new() -> Self { Self::default() }

	/// Returns the cached resolution for `name`.
	///
	/// `Found` entries whose artifact has been released are dropped and reported
	/// as absent.
	pub fn lookup( &self, name: &str ) -> Option<Resolution> {
		let resolution = self.entries.get( name ).map(| entry | entry.value().clone() )?;
		match resolution {
			Resolution::Found( symbol ) if !symbol.is_live() => {
				self.entries.remove_if( name, |_, cached | matches!( cached, Resolution::Found( s ) if s == &symbol ));
				None
			},
			resolution => Some( resolution ),
		}
	}

	/// Live symbol for `name`, if one has been loaded.
	pub fn loaded( &self, name: &str ) -> Option<Symbol> {
		match self.lookup( name )? {
			Resolution::Found( symbol ) => Some( symbol ),
			Resolution::Missing => None,
		}
	}

	/// Records a successful resolution and returns the symbol now cached for `name`.
	pub fn insert_found( &self, name: &str, symbol: Symbol ) -> Symbol {
		match self.entries.entry( name.to_string() ) {
			Entry::Occupied( mut entry ) => {
				let winner = match entry.get() {
					Resolution::Found( existing ) if existing.is_live() => Some( existing.clone() ),
					_ => None,
				};
				match winner {
					Some( existing ) => existing,
					None => { entry.insert( Resolution::Found( symbol.clone() )); symbol },
				}
			},
			Entry::Vacant( entry ) => { entry.insert( Resolution::Found( symbol.clone() )); symbol },
		}
	}

	/// Records that a full search for `name` came up empty. Never overwrites a hit.
	pub fn insert_missing( &self, name: &str ) {
		self.entries.entry( name.to_string() ).or_insert( Resolution::Missing );
	}

	/// Forgets every negative entry; called when the search path grows.
	pub fn purge_missing( &self ) {
		self.entries.retain(|_, resolution | matches!( resolution, Resolution::Found( _ )));
	}

	pub fn clear( &self ) { self.entries.clear() }

	#[cfg( test )]
	pub fn len( &self ) -> usize { self.entries.len() }

}

#[cfg( test )]
mod tests {
	use std::sync::Arc ;
	use super::{ Resolution, SymbolCache };
	use crate::artifact::OpenArtifact ;
	use crate::{ Definition, NativeBundle, Symbol, SymbolKind };

	fn symbol( artifact: &Arc<OpenArtifact>, name: &str ) -> Symbol {
		Symbol::bind( name, Definition::new( "file:///cache", SymbolKind::Shared( Arc::new( ()))), artifact )
	}

	fn artifact() -> Arc<OpenArtifact> {
		Arc::new( OpenArtifact::new( Arc::new( NativeBundle::new( "file:///cache" ))))
	}

	#[test]
	fn first_found_wins() {
		let artifact = artifact();
		let cache = SymbolCache::new();
		let first = cache.insert_found( "a.B", symbol( &artifact, "a.B" ));
		let second = cache.insert_found( "a.B", symbol( &artifact, "a.B" ));
		assert_eq!( first, second );
	}

	#[test]
	fn missing_is_purged_but_found_is_kept() {
		let artifact = artifact();
		let cache = SymbolCache::new();
		cache.insert_missing( "a.Missing" );
		cache.insert_found( "a.Found", symbol( &artifact, "a.Found" ));
		cache.purge_missing();
		assert!( cache.lookup( "a.Missing" ).is_none() );
		assert!( matches!( cache.lookup( "a.Found" ), Some( Resolution::Found( _ ))));
	}

	#[test]
	fn missing_never_overwrites_found() {
		let artifact = artifact();
		let cache = SymbolCache::new();
		cache.insert_found( "a.B", symbol( &artifact, "a.B" ));
		cache.insert_missing( "a.B" );
		assert!( cache.loaded( "a.B" ).is_some() );
	}

	#[test]
	fn released_artifact_invalidates_entry() {
		let artifact = artifact();
		let cache = SymbolCache::new();
		cache.insert_found( "a.B", symbol( &artifact, "a.B" ));
		artifact.close().unwrap();
		assert!( cache.lookup( "a.B" ).is_none() );
		assert_eq!( cache.len(), 0 );
	}
}
