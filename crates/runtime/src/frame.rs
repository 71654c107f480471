use cadence_extract::SnapshotView;
use cadence_render::{
    CommandSink, PoseStack, RenderContext, RenderQueue, RenderQueueConsumer, RendererRegistry,
    Telemetry,
};
use std::time::Instant;

/// One render pass over the latest published snapshots.
///
/// For each snapshot the pose stack is positioned at the entity's
/// interpolated transform before the renderer runs, and restored after.
/// Renderer errors skip that entity for the frame and are never fatal.
/// Finally the command queue is swapped and flushed into `sink`.
///
/// Returns the number of commands flushed.
pub fn render_frame(
    view: &SnapshotView,
    registry: &mut RendererRegistry,
    queue: &RenderQueue,
    consumer: &mut RenderQueueConsumer,
    sink: &mut impl CommandSink,
    telemetry: &mut Telemetry,
) -> usize {
    let start = Instant::now();
    telemetry.begin_frame();

    let snapshots = view.latest();
    let mut pose = PoseStack::new();

    for snapshot in snapshots.values() {
        let transform = snapshot.interpolated();
        pose.push();
        pose.translate(transform.position);
        pose.rotate(transform.rotation);
        pose.scale(transform.scale);

        let mut ctx = RenderContext {
            pose: &mut pose,
            queue,
        };
        match registry.render(snapshot, &mut ctx) {
            Ok(()) => telemetry.record_rendered(),
            Err(error) => {
                tracing::warn!(
                    entity = snapshot.id.0,
                    type_key = snapshot.type_key.as_str(),
                    %error,
                    "skipping entity this frame"
                );
                telemetry.record_culled();
            }
        }
        pose.pop();
    }

    consumer.swap();
    let flushed = consumer.flush(sink);
    telemetry.record_flushed(flushed);
    telemetry.end_frame(start.elapsed());
    flushed
}
