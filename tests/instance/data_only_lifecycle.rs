use mod_link::{ ModInstance, ModState };

use crate::test_configs::config ;
use crate::test_mods::api ;

#[test]
fn instance_data_only_lifecycle() {

	let mut instance = ModInstance::data_only( config( "app.textures", &[] ));

	// No mod object, so every hook is trivially satisfied.
	instance.start( &api() ).unwrap();
	assert_eq!( instance.state(), ModState::Running );
	assert!( !instance.can_suspend() );
	assert!( instance.can_unload() );

	instance.suspend().unwrap();
	assert_eq!( instance.state(), ModState::Running );

	instance.dispose().unwrap();

}
