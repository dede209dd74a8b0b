//! 栄養士による申込の判断（確定・拒否）

mod accept;
mod reject;
