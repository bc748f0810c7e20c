//! Fixed worker pool for per-bot jobs.
//!
//! The orchestrator feeds Move and CollisionCheck jobs into a pending queue
//! and collects them from a completed queue after the barrier. A job owns
//! its bot while it is processed, so no two workers can ever touch the same
//! bot, and carries a shared snapshot of the prior-frame maps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::game::bot::{Bot, BotId, FrameContext};

/// What a job does with its bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Move,
    CollisionCheck,
}

/// One unit of per-bot work, owning the bot for the duration of processing.
pub struct BotJob {
    pub kind: JobKind,
    /// Position of the bot in the field's insertion order
    pub index: usize,
    pub bot: Bot,
    ctx: Arc<FrameContext>,
    /// Move output: number of segments the move event carries
    pub steps: usize,
    /// CollisionCheck output: owner of the first foreign segment hit
    pub killer: Option<BotId>,
}

impl BotJob {
    pub fn new_move(index: usize, bot: Bot, ctx: Arc<FrameContext>) -> Self {
        Self {
            kind: JobKind::Move,
            index,
            bot,
            ctx,
            steps: 0,
            killer: None,
        }
    }

    pub fn new_collision_check(index: usize, bot: Bot, ctx: Arc<FrameContext>) -> Self {
        Self {
            kind: JobKind::CollisionCheck,
            index,
            bot,
            ctx,
            steps: 0,
            killer: None,
        }
    }

    /// Run the handler for this job's kind. Called from exactly one worker.
    fn run(&mut self) {
        match self.kind {
            JobKind::Move => {
                self.steps = self.bot.perform_move(&self.ctx);
            }
            JobKind::CollisionCheck => {
                self.killer = self.bot.check_collision(&self.ctx);
            }
        }
    }
}

struct PoolShared {
    /// Jobs submitted but not yet moved to the completed queue
    open_jobs: Mutex<usize>,
    all_done: Condvar,
    shutdown: AtomicBool,
}

/// Fixed-size pool of worker threads draining a pending queue into a
/// completed queue.
pub struct BotThreadPool {
    pending_tx: Option<Sender<BotJob>>,
    completed_rx: Receiver<BotJob>,
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl BotThreadPool {
    pub fn new(num_threads: usize) -> Self {
        let (pending_tx, pending_rx) = unbounded::<BotJob>();
        let (completed_tx, completed_rx) = unbounded::<BotJob>();
        let shared = Arc::new(PoolShared {
            open_jobs: Mutex::new(0),
            all_done: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let workers = (0..num_threads.max(1))
            .map(|_| {
                let pending_rx = pending_rx.clone();
                let completed_tx = completed_tx.clone();
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(pending_rx, completed_tx, shared))
            })
            .collect();

        Self {
            pending_tx: Some(pending_tx),
            completed_rx,
            shared,
            workers,
        }
    }

    /// Queue a job for processing. Processing starts immediately.
    pub fn submit(&self, job: BotJob) {
        {
            let mut open = self.shared.open_jobs.lock();
            *open += 1;
        }
        if let Some(tx) = &self.pending_tx {
            if tx.send(job).is_err() {
                // pool already shut down; the job is dropped
                finish_one(&self.shared);
            }
        }
    }

    /// Block until every submitted job has been processed and moved to the
    /// completed queue. Establishes a happens-before relationship between
    /// job completion and subsequent orchestrator reads.
    pub fn wait_for_completion(&self) {
        let mut open = self.shared.open_jobs.lock();
        while *open > 0 {
            self.shared.all_done.wait(&mut open);
        }
    }

    /// Pop one completed job, if any.
    pub fn next_completed(&self) -> Option<BotJob> {
        self.completed_rx.try_recv().ok()
    }
}

impl Drop for BotThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        // closing the channel wakes idle workers; jobs still pending are
        // discarded by the workers without being run
        self.pending_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(pending: Receiver<BotJob>, completed: Sender<BotJob>, shared: Arc<PoolShared>) {
    for mut job in pending.iter() {
        if shared.shutdown.load(Ordering::Acquire) {
            // drop the job unprocessed so wait_for_completion returns
            finish_one(&shared);
            continue;
        }
        job.run();
        let _ = completed.send(job);
        finish_one(&shared);
    }
}

fn finish_one(shared: &PoolShared) {
    let mut open = shared.open_jobs.lock();
    *open -= 1;
    if *open == 0 {
        shared.all_done.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::game::bot::{BotController, BotHandle, ControllerView, LogBuffer, Steering};
    use crate::game::snake::Snake;
    use crate::game::spatial::SpatialMap;
    use crate::game::torus::TorusGeometry;
    use crate::util::vec2::Vec2;
    use uuid::Uuid;

    struct StraightAhead;

    impl BotController for StraightAhead {
        fn init(&mut self, _bot: &BotHandle) -> Result<(), String> {
            Ok(())
        }

        fn step(
            &mut self,
            view: &ControllerView<'_>,
            _log: &mut LogBuffer,
        ) -> Result<Steering, String> {
            Ok(Steering {
                target_heading_deg: view.heading(),
                boost: false,
            })
        }
    }

    fn context() -> Arc<FrameContext> {
        Arc::new(FrameContext {
            food: Arc::new(SpatialMap::new(100.0, 100.0, 10, 10, 4)),
            segments: Arc::new(SpatialMap::new(100.0, 100.0, 10, 10, 4)),
            torus: TorusGeometry::new(100.0, 100.0),
            config: Arc::new(SimulationConfig {
                field_size_x: 100.0,
                field_size_y: 100.0,
                ..Default::default()
            }),
        })
    }

    fn test_bot(index: u128) -> Bot {
        let config = SimulationConfig {
            field_size_x: 100.0,
            field_size_y: 100.0,
            ..Default::default()
        };
        Bot::new(
            Uuid::from_u128(index),
            index as i64,
            0,
            format!("bot-{index}"),
            0,
            Snake::new(Vec2::new(10.0 + index as f32, 50.0), 0.0, 10.0, &config),
            Box::new(StraightAhead),
            10,
        )
    }

    #[test]
    fn test_all_jobs_complete_exactly_once() {
        let pool = BotThreadPool::new(4);
        let ctx = context();

        for i in 0..16 {
            pool.submit(BotJob::new_move(i, test_bot(i as u128), Arc::clone(&ctx)));
        }
        pool.wait_for_completion();

        let mut seen = vec![false; 16];
        while let Some(job) = pool.next_completed() {
            assert!(!seen[job.index], "job {} completed twice", job.index);
            seen[job.index] = true;
            assert_eq!(job.steps, job.bot.snake().segments().len());
        }
        assert!(seen.iter().all(|&s| s), "all jobs must complete");
    }

    #[test]
    fn test_wait_with_no_jobs_returns_immediately() {
        let pool = BotThreadPool::new(2);
        pool.wait_for_completion();
        assert!(pool.next_completed().is_none());
    }

    #[test]
    fn test_move_jobs_advance_bots() {
        let pool = BotThreadPool::new(2);
        let ctx = context();
        pool.submit(BotJob::new_move(0, test_bot(1), Arc::clone(&ctx)));
        pool.wait_for_completion();

        let job = pool.next_completed().expect("job must complete");
        assert!((job.bot.snake().head_position().x - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_collision_check_job() {
        let pool = BotThreadPool::new(2);
        let ctx = context();
        pool.submit(BotJob::new_collision_check(0, test_bot(1), Arc::clone(&ctx)));
        pool.wait_for_completion();

        let job = pool.next_completed().expect("job must complete");
        assert_eq!(job.kind, JobKind::CollisionCheck);
        assert_eq!(job.killer, None);
    }

    #[test]
    fn test_multiple_rounds_reuse_pool() {
        let pool = BotThreadPool::new(2);
        let ctx = context();

        for round in 0..3 {
            for i in 0..4 {
                pool.submit(BotJob::new_move(i, test_bot(i as u128), Arc::clone(&ctx)));
            }
            pool.wait_for_completion();
            let mut count = 0;
            while pool.next_completed().is_some() {
                count += 1;
            }
            assert_eq!(count, 4, "round {round} lost jobs");
        }
    }
}
