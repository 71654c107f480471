use glam::{Mat4, Quat, Vec3};

/// Hierarchical transform accumulator for walking a bone tree.
///
/// `push` duplicates the top matrix by value and `pop` restores the previous
/// one, mirroring save/restore discipline. The root identity entry is a
/// sentinel: `pop` with only the sentinel left is a no-op, so unbalanced
/// pops cannot corrupt the stack.
#[derive(Debug, Clone)]
pub struct PoseStack {
    stack: Vec<Mat4>,
}

impl PoseStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }

    /// Duplicate the current top. Every mutation until the matching `pop`
    /// affects only the copy.
    pub fn push(&mut self) {
        let top = *self.top();
        self.stack.push(top);
    }

    /// Restore the previous transform. No-op at the root sentinel.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// The current composed transform, for GPU upload or command capture.
    pub fn peek(&self) -> &Mat4 {
        self.top()
    }

    /// Number of entries including the root sentinel.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn translate(&mut self, offset: Vec3) {
        let top = self.top_mut();
        *top *= Mat4::from_translation(offset);
    }

    pub fn rotate(&mut self, rotation: Quat) {
        let top = self.top_mut();
        *top *= Mat4::from_quat(rotation);
    }

    pub fn scale(&mut self, factors: Vec3) {
        let top = self.top_mut();
        *top *= Mat4::from_scale(factors);
    }

    /// Rotate about a bone's pivot rather than the origin: translate to the
    /// pivot, rotate, translate back by the negated pivot.
    pub fn rotate_around(&mut self, rotation: Quat, pivot: Vec3) {
        self.translate(pivot);
        self.rotate(rotation);
        self.translate(-pivot);
    }

    /// Reset the top (only the top) to identity.
    pub fn set_identity(&mut self) {
        *self.top_mut() = Mat4::IDENTITY;
    }

    fn top(&self) -> &Mat4 {
        // The sentinel guarantees non-emptiness.
        self.stack.last().expect("pose stack has a root sentinel")
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        self.stack.last_mut().expect("pose stack has a root sentinel")
    }
}

impl Default for PoseStack {
    fn default() -> Self {
        Self::new()
    }
}
