mod bus;

pub use bus::{AddressChangeHandler, EventBus, QueryCompleteHandler, QueryStartHandler};
