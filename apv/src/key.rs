// technically not part of ActivityStreams but every federating actor carries one

use crate::{getter, setter};

pub trait PublicKey : super::Base {
	fn owner(&self) -> crate::Field<&str>;
	fn public_key_pem(&self) -> crate::Field<&str>;
}

pub trait PublicKeyMut : super::BaseMut {
	fn set_owner(self, val: Option<&str>) -> Self;
	fn set_public_key_pem(self, val: Option<&str>) -> Self;
}

impl PublicKey for serde_json::Value {
	getter! { owner -> &str }
	getter! { public_key_pem::publicKeyPem -> &str }
}

impl PublicKeyMut for serde_json::Value {
	setter! { owner -> &str }
	setter! { public_key_pem::publicKeyPem -> &str }
}
