pub mod irq;
pub use irq::PrimaskIrq;
