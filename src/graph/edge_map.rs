use super::StepId;

/// Adjacency lists of a step graph: for every source step, its `(target, attribute)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap<T>(Vec<Vec<(StepId, T)>>);

impl<T> Default for EdgeMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> EdgeMap<T> {
    pub fn with_nodes(count: usize) -> Self {
        Self((0..count).map(|_| Vec::new()).collect())
    }

    /// Registers a new node without edges and returns its id.
    pub fn push_node(&mut self) -> StepId {
        self.0.push(Vec::new());
        self.0.len() - 1
    }

    pub fn add(&mut self, from: StepId, to: StepId, attribute: T) {
        if self.0.len() <= from.max(to) {
            self.0.resize_with(from.max(to) + 1, Vec::new);
        }
        self.0[from].push((to, attribute));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, source: StepId, target: StepId) -> bool {
        self.iter_edges_of(source).any(|next| next == target)
    }

    pub fn iter_edges_of(&self, state: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.iter_of(state).map(|&(next, _)| next)
    }

    pub fn iter_of(&self, state: StepId) -> impl Iterator<Item = &(StepId, T)> {
        self.0.get(state).into_iter().flat_map(|edges| edges.iter())
    }

    pub fn count_of(&self, state: StepId) -> usize {
        self.0.get(state).map(|edges| edges.len()).unwrap_or(0)
    }

    pub fn shrink_to_fit(&mut self) {
        for edges in self.0.iter_mut() {
            edges.shrink_to_fit();
        }

        self.0.shrink_to_fit();
    }

    pub fn reverse(&self) -> EdgeMap<T>
    where
        T: Clone,
    {
        let mut res = EdgeMap::with_nodes(self.0.len());

        for (node, edges) in self.0.iter().enumerate() {
            for (edge, attribute) in edges.iter() {
                res.add(*edge, node, attribute.clone());
            }
        }

        res
    }
}
