mod dispatch;
mod triggered_timeout;

use core::cell::RefCell;
use std::vec::Vec;

use crate::dispatch::IrqEvent;

std::thread_local! {
    static FIRED: RefCell<Vec<(usize, IrqEvent)>> = const { RefCell::new(Vec::new()) };
}

/// Handler that logs every call on the current test thread.
fn record(handle: usize, event: IrqEvent) {
    FIRED.with(|fired| fired.borrow_mut().push((handle, event)));
}

/// Calls logged by [`record`] since the last take.
fn take_fired() -> Vec<(usize, IrqEvent)> {
    FIRED.with(|fired| fired.take())
}
