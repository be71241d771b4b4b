use crate::strenum;

strenum! {
	pub enum RejectType {
		Reject,
		TentativeReject;
	};
}
