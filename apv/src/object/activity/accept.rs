use crate::strenum;

strenum! {
	pub enum AcceptType {
		Accept,
		TentativeAccept;
	};
}
