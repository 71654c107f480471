use crate::layer::{ModelRef, OverlayTag, RenderLayer};
use glam::Mat4;
use std::sync::{Arc, Mutex};

/// One draw intent, fully value-copied at submission time.
///
/// The pose matrix is captured by value (a snapshot of the pose stack top,
/// not a reference to it), which is what keeps the consumer from observing
/// partially updated producer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCommand {
    pub pose: Mat4,
    pub model: ModelRef,
    pub layer: RenderLayer,
    pub overlay: OverlayTag,
}

/// The GPU submission collaborator's boundary: consumes one command at a
/// time, in order.
pub trait CommandSink {
    fn execute(&mut self, command: &RenderCommand);
}

impl<F: FnMut(&RenderCommand)> CommandSink for F {
    fn execute(&mut self, command: &RenderCommand) {
        self(command)
    }
}

struct Shared {
    recording: Mutex<Vec<RenderCommand>>,
}

/// Create the double-buffered command queue: a cloneable producer handle and
/// the single consumer.
pub fn command_queue() -> (RenderQueue, RenderQueueConsumer) {
    let shared = Arc::new(Shared {
        recording: Mutex::new(Vec::new()),
    });
    (
        RenderQueue {
            shared: shared.clone(),
        },
        RenderQueueConsumer {
            shared,
            execution: Vec::new(),
        },
    )
}

/// Producer handle: appends to the recording list under a short lock.
#[derive(Clone)]
pub struct RenderQueue {
    shared: Arc<Shared>,
}

impl RenderQueue {
    /// Record one command. `RenderCommand` is `Copy`, so everything inside
    /// is captured by value here.
    pub fn submit(&self, command: RenderCommand) {
        self.shared
            .recording
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command);
    }

    /// Number of commands recorded and not yet swapped.
    pub fn pending(&self) -> usize {
        self.shared
            .recording
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Consumer half: swaps the recording list in and flushes it lock-free.
pub struct RenderQueueConsumer {
    shared: Arc<Shared>,
    execution: Vec<RenderCommand>,
}

impl RenderQueueConsumer {
    /// Exchange recording and execution under one short critical section.
    /// The new recording list starts empty (the drained execution buffer is
    /// reused for it). Returns the batch size.
    pub fn swap(&mut self) -> usize {
        self.execution.clear();
        let mut recording = self
            .shared
            .recording
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::swap(&mut *recording, &mut self.execution);
        self.execution.len()
    }

    /// Execute the swapped batch in submission order. Holds no lock, so
    /// producers keep recording the next batch concurrently. The execution
    /// list is not mutated here; the next `swap` reclaims it.
    pub fn flush(&mut self, sink: &mut impl CommandSink) -> usize {
        for command in &self.execution {
            sink.execute(command);
        }
        self.execution.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{ShaderRef, TextureRef};

    fn command(tag: u64) -> RenderCommand {
        RenderCommand {
            pose: Mat4::IDENTITY,
            model: ModelRef(tag),
            layer: RenderLayer::solid(TextureRef(0), ShaderRef(0)),
            overlay: OverlayTag::default(),
        }
    }

    #[test]
    fn batch_executes_in_submission_order_exactly_once() {
        let (queue, mut consumer) = command_queue();
        for tag in 0..100 {
            queue.submit(command(tag));
        }
        assert_eq!(consumer.swap(), 100);

        let mut seen = Vec::new();
        consumer.flush(&mut |c: &RenderCommand| seen.push(c.model.0));
        assert_eq!(seen, (0..100).collect::<Vec<u64>>());
    }

    #[test]
    fn nothing_submitted_before_swap_is_dropped() {
        let (queue, mut consumer) = command_queue();
        queue.submit(command(1));
        queue.submit(command(2));
        assert_eq!(consumer.swap(), 2);
        let mut count = 0usize;
        consumer.flush(&mut |_: &RenderCommand| count += 1);
        assert_eq!(count, 2);
    }

    #[test]
    fn commands_after_swap_land_in_the_next_batch() {
        let (queue, mut consumer) = command_queue();
        queue.submit(command(1));
        consumer.swap();
        queue.submit(command(2));

        let mut first = Vec::new();
        consumer.flush(&mut |c: &RenderCommand| first.push(c.model.0));
        assert_eq!(first, vec![1]);

        consumer.swap();
        let mut second = Vec::new();
        consumer.flush(&mut |c: &RenderCommand| second.push(c.model.0));
        assert_eq!(second, vec![2]);
    }

    #[test]
    fn empty_swap_flushes_nothing() {
        let (_queue, mut consumer) = command_queue();
        assert_eq!(consumer.swap(), 0);
        assert_eq!(consumer.flush(&mut |_: &RenderCommand| {}), 0);
    }

    #[test]
    fn batches_never_interleave_across_swaps() {
        let (queue, mut consumer) = command_queue();
        for tag in 0..10 {
            queue.submit(command(tag));
        }
        consumer.swap();
        for tag in 10..20 {
            queue.submit(command(tag));
        }

        let mut order = Vec::new();
        consumer.flush(&mut |c: &RenderCommand| order.push(c.model.0));
        consumer.swap();
        consumer.flush(&mut |c: &RenderCommand| order.push(c.model.0));
        assert_eq!(order, (0..20).collect::<Vec<u64>>());
    }

    #[test]
    fn producers_record_from_another_thread() {
        let (queue, mut consumer) = command_queue();
        let producer = queue.clone();
        let writer = std::thread::spawn(move || {
            for tag in 0..1000 {
                producer.submit(command(tag));
            }
        });
        writer.join().unwrap();

        consumer.swap();
        let mut seen = Vec::new();
        consumer.flush(&mut |c: &RenderCommand| seen.push(c.model.0));
        assert_eq!(seen.len(), 1000);
        // Single producer: submission order is preserved.
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
