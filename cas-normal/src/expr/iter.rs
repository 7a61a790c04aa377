use super::Expr;

/// Walks an expression tree children first, left to right, ending with the root. Call
/// arguments and `rootof` coefficients are children too.
///
/// Created by [`Expr::post_order_iter`].
pub struct ExprIter<'a> {
    pending: Vec<&'a Expr>,

    /// The node returned last. A node whose last child is this one has all of its children done.
    done: Option<&'a Expr>,
}

impl<'a> ExprIter<'a> {
    pub fn new(root: &'a Expr) -> Self {
        Self { pending: vec![root], done: None }
    }
}

impl<'a> Iterator for ExprIter<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = *self.pending.last()?;
            let children = top.children();
            let finished = match (children.last(), self.done) {
                (None, _) => true,
                (Some(&last), Some(done)) => std::ptr::eq(last, done),
                (Some(_), None) => false,
            };
            if finished {
                self.done = self.pending.pop();
                return self.done;
            }
            self.pending.extend(children.into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn post_order() {
        // (x + 2) * sqrt(y)
        let expr = Expr::Mul(vec![
            Expr::Add(vec![Expr::symbol("x"), Expr::int(2)]),
            Expr::symbol("y").sqrt(),
        ]);
        let visited: Vec<String> = expr.post_order_iter().map(|e| e.to_string()).collect();
        assert_eq!(visited, vec![
            "x", "2", "x + 2", "y", "1/2", "sqrt(y)", "(x + 2)*sqrt(y)",
        ]);
    }
}
