#![allow(dead_code)]

use async_trait::async_trait;
use chainline::{Worker, WorkerContext, WorkerError};

/// Forwards every payload downstream until the input closes.
#[derive(Debug, Clone)]
pub struct Forward;

#[async_trait]
impl Worker<String> for Forward {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        while let Some(msg) = ctx.get().await {
            ctx.send(msg);
        }
        Ok(())
    }
}

/// Forwards every payload twice.
#[derive(Debug, Clone)]
pub struct Doubler;

#[async_trait]
impl Worker<String> for Doubler {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        while let Some(msg) = ctx.get().await {
            ctx.send(msg.clone());
            ctx.send(msg);
        }
        Ok(())
    }
}

/// Fails with the configured reason as soon as any payload arrives.
#[derive(Debug, Clone)]
pub struct CrashOn {
    pub reason: &'static str,
}

#[async_trait]
impl Worker<String> for CrashOn {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        if ctx.get().await.is_some() {
            return Err(WorkerError::new(self.reason));
        }
        Ok(())
    }
}

/// Panics with the configured payload as soon as any payload arrives.
#[derive(Debug, Clone)]
pub struct PanicOn {
    pub payload: &'static str,
}

#[async_trait]
impl Worker<String> for PanicOn {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        if ctx.get().await.is_some() {
            panic!("{}", self.payload);
        }
        Ok(())
    }
}

/// Forwards the first payload, then fails on the next one.
#[derive(Debug, Clone)]
pub struct ForwardOnceThenCrash {
    pub reason: &'static str,
}

#[async_trait]
impl Worker<String> for ForwardOnceThenCrash {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        if let Some(msg) = ctx.get().await {
            ctx.send(msg);
        }
        if ctx.get().await.is_some() {
            return Err(WorkerError::new(self.reason));
        }
        Ok(())
    }
}

/// Forwards downstream and also delivers a copy to every peer bound to
/// `tag` in the options bag.
#[derive(Debug, Clone)]
pub struct Tee {
    pub tag: &'static str,
}

#[async_trait]
impl Worker<String> for Tee {
    async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
        while let Some(msg) = ctx.get().await {
            ctx.send_to(self.tag, msg.clone());
            ctx.send(msg);
        }
        Ok(())
    }
}
