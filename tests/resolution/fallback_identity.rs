use std::sync::Arc ;
use wasm_plugin_loader::{ ModuleLoader, ModuleRegistry, NativeBundle, SymbolKind };

fn owner_in( registry: &Arc<ModuleRegistry> ) -> ModuleLoader {
	let owner = ModuleLoader::in_registry( Arc::clone( registry ));
	owner.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/owner.bundle" ).with_shared( "owner.Codec", 7_u32 )))
		.expect( "Failed to add artifact" );
	owner
}

#[test]
fn fallback_returns_the_owners_symbol() {

	let registry = ModuleRegistry::new();
	let owner = owner_in( &registry );
	let asking = ModuleLoader::in_registry( Arc::clone( &registry ));

	let through_fallback = asking.find_symbol( "owner.Codec", true ).expect( "Fallback failed" );
	let at_home = owner.find_symbol( "owner.Codec", false ).expect( "Local resolution failed" );

	assert_eq!( through_fallback, at_home );
	assert_eq!( through_fallback.location(), "file:///plugins/owner.bundle" );
	match through_fallback.kind() {
		SymbolKind::Shared( value ) => assert_eq!( value.downcast_ref::<u32>(), Some( &7 )),
		kind => panic!( "Expected a shared value, found: {:#?}", kind ),
	}

}

#[test]
fn fallback_hit_is_cached_on_the_asking_loader() {

	let registry = ModuleRegistry::new();
	let _owner = owner_in( &registry );
	let asking = ModuleLoader::in_registry( Arc::clone( &registry ));

	assert!( asking.find_loaded( "owner.Codec" ).is_none() );
	let symbol = asking.find_symbol( "owner.Codec", true ).expect( "Fallback failed" );

	assert_eq!( asking.find_loaded( "owner.Codec" ), Some( symbol.clone() ));
	assert_eq!( asking.find_symbol( "owner.Codec", false ).expect( "Cached symbol missing" ), symbol );

}

#[test]
fn fallback_local_definition_wins() {

	let registry = ModuleRegistry::new();
	let _owner = owner_in( &registry );
	let asking = ModuleLoader::in_registry( Arc::clone( &registry ));
	asking.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/asking.bundle" ).with_shared( "owner.Codec", 8_u32 )))
		.expect( "Failed to add artifact" );

	let symbol = asking.find_symbol( "owner.Codec", true ).expect( "Resolution failed" );
	assert_eq!( symbol.location(), "file:///plugins/asking.bundle" );

}
