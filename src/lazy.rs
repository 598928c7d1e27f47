//! Load-once holder for the compression engine.
//!
//! [`LazyEngine`] runs an [`EngineLoader`] the first time an engine is asked for, and keeps the
//! result for every later call. Concurrent first callers share a single load; a failed load is
//! not cached.

use crate::compress::EngineLoader;
use crate::error::Result;
use futures_util::lock::Mutex;
use std::{fmt, sync::OnceLock};

/// A compression engine that is loaded on first use and then kept.
///
/// Only one load runs at a time: callers that arrive while a load is in flight wait for it
/// instead of starting their own. If the load fails, nothing is stored and the next caller tries
/// again. There's no timeout; a caller that wants one can race the returned future against a
/// timer.
pub struct LazyEngine<L: EngineLoader> {
    loader: L,
    engine: OnceLock<L::Engine>,
    loading: Mutex<()>,
}

impl<L: EngineLoader> LazyEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            engine: OnceLock::new(),
            loading: Mutex::new(()),
        }
    }

    /// Get the engine, loading it first if needed.
    pub async fn get(&self) -> Result<&L::Engine> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine);
        }
        let _guard = self.loading.lock().await;
        // Someone else may have finished loading while we waited.
        if let Some(engine) = self.engine.get() {
            return Ok(engine);
        }
        tracing::debug!("loading compression engine");
        match self.loader.load().await {
            Ok(engine) => {
                tracing::debug!("compression engine ready");
                Ok(self.engine.get_or_init(|| engine))
            }
            Err(e) => {
                tracing::warn!(error = %e, "compression engine failed to load");
                Err(e)
            }
        }
    }

    /// The engine, if it has already been loaded.
    pub fn try_get(&self) -> Option<&L::Engine> {
        self.engine.get()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

impl<L: EngineLoader + fmt::Debug> fmt::Debug for LazyEngine<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LazyEngine")
            .field("loader", &self.loader)
            .field("loaded", &self.engine.get().is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::compress::{CompressionError, Compressor};
    use crate::error::Error;
    use futures_core::future::BoxFuture;
    use std::{
        future::Future,
        pin::Pin,
        sync::atomic::{AtomicUsize, Ordering},
        task::{Context, Poll},
    };

    /// Stores bytes unchanged.
    #[derive(Debug)]
    pub(crate) struct Stored;

    impl Compressor for Stored {
        fn compress(&self, src: &[u8]) -> Result<Vec<u8>, CompressionError> {
            Ok(src.to_vec())
        }

        fn decompress(&self, src: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError> {
            if src.len() > max_size {
                return Err(CompressionError::ExceededSize {
                    max: max_size,
                    actual: src.len(),
                });
            }
            Ok(src.to_vec())
        }
    }

    /// Returns `Pending` once before completing, so that other futures get polled in between.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();
        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Fails the first `failures` loads, then hands out [`Stored`].
    #[derive(Debug, Default)]
    pub(crate) struct CountingLoader {
        pub(crate) failures: usize,
        pub(crate) loads: AtomicUsize,
    }

    impl EngineLoader for CountingLoader {
        type Engine = Stored;

        fn load(&self) -> BoxFuture<'_, Result<Stored, Error>> {
            Box::pin(async move {
                let n = self.loads.fetch_add(1, Ordering::SeqCst);
                YieldOnce(false).await;
                if n < self.failures {
                    Err(Error::EngineLoad(format!("attempt {} failed", n)))
                } else {
                    Ok(Stored)
                }
            })
        }
    }

    #[test]
    fn loads_once() {
        let lazy = LazyEngine::new(CountingLoader::default());
        assert!(lazy.try_get().is_none());
        futures_executor::block_on(async {
            lazy.get().await.unwrap();
            lazy.get().await.unwrap();
        });
        assert!(lazy.try_get().is_some());
        assert_eq!(lazy.loader().loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_retried() {
        let lazy = LazyEngine::new(CountingLoader {
            failures: 2,
            ..Default::default()
        });
        futures_executor::block_on(async {
            assert_eq!(
                lazy.get().await.unwrap_err(),
                Error::EngineLoad("attempt 0 failed".into())
            );
            assert!(lazy.get().await.is_err());
            assert!(lazy.try_get().is_none());
            lazy.get().await.unwrap();
            lazy.get().await.unwrap();
        });
        assert_eq!(lazy.loader().loads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn concurrent_callers_share_load() {
        let lazy = LazyEngine::new(CountingLoader::default());
        futures_executor::block_on(async {
            let (a, b, c) = futures_util::join!(lazy.get(), lazy.get(), lazy.get());
            a.unwrap();
            b.unwrap();
            c.unwrap();
        });
        assert_eq!(lazy.loader().loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_failure_then_retry() {
        let lazy = LazyEngine::new(CountingLoader {
            failures: 1,
            ..Default::default()
        });
        futures_executor::block_on(async {
            let (a, b) = futures_util::join!(lazy.get(), lazy.get());
            // The first load fails; the waiting caller starts a fresh one.
            assert!(a.is_err());
            assert!(b.is_ok());
        });
        assert_eq!(lazy.loader().loads.load(Ordering::SeqCst), 2);
    }
}
