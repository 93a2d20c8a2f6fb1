use std::sync::Arc ;
use std::thread ;
use wasm_plugin_loader::{ ModuleLoader, ModuleRegistry, NativeBundle, ResolveError };

const THREADS: usize = 8 ;

#[test]
fn concurrent_resolution_converges() {

	let registry = ModuleRegistry::new();
	let owner = ModuleLoader::in_registry( Arc::clone( &registry ));
	owner.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/owner.bundle" ).with_shared( "owner.Value", ())))
		.expect( "Failed to add artifact" );
	let asking = ModuleLoader::in_registry( Arc::clone( &registry ));

	let symbols = thread::scope(| scope | {
		let handles = ( 0..THREADS )
			.map(|_| scope.spawn(|| asking.find_symbol( "owner.Value", true )))
			.collect::<Vec<_>>();
		handles.into_iter()
			.map(| handle | handle.join().expect( "Resolver panicked" ).expect( "Resolution failed" ))
			.collect::<Vec<_>>()
	});

	assert!( symbols.windows( 2 ).all(| pair | pair[0] == pair[1] ));
	assert_eq!( asking.find_symbol( "owner.Value", true ).expect( "Resolution failed" ), symbols[0] );
	assert_eq!( owner.find_symbol( "owner.Value", false ).expect( "Resolution failed" ), symbols[0] );

}

#[test]
fn concurrent_close_during_fallback() {

	for round in 0..16 {

		let registry = ModuleRegistry::new();
		let owner = ModuleLoader::in_registry( Arc::clone( &registry ));
		owner.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/owner.bundle" ).with_shared( "owner.Value", ())))
			.expect( "Failed to add artifact" );
		let askers = ( 0..THREADS ).map(|_| ModuleLoader::in_registry( Arc::clone( &registry ))).collect::<Vec<_>>();

		thread::scope(| scope | {
			let resolvers = askers.iter()
				.map(| asking | scope.spawn(|| asking.find_symbol( "owner.Value", true )))
				.collect::<Vec<_>>();
			owner.close().expect( "Failed to close loader" );
			for resolver in resolvers {
				match resolver.join().expect( "Resolver panicked" ) {
					Ok( _ ) | Err( ResolveError::NotFound( _ )) => {},
					Err( err ) => panic!( "Unexpected error in round {}: {}", round, err ),
				}
			}
		});

		assert_eq!( registry.len(), THREADS );

	}

}
