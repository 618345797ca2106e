pub mod irq;
pub use irq::{CriticalSection, CsIrq, IrqControl};
pub mod irq_mutex;
pub use irq_mutex::IrqMutex;
