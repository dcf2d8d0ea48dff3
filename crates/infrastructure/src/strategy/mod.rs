mod recursive;

pub use recursive::RecursiveQueryStrategy;
