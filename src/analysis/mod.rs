//! Whole-capture analysis across samples.

pub mod consumers;

pub use consumers::{
    Consumer, ConsumerProfile, DEFAULT_CONSUMERS, MetricRanking, TopConsumers, top_consumers,
};
