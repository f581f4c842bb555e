use std::fmt;

/// Handle returned by [`Subject::subscribe`], used to detach an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<T> = Box<dyn FnMut(&T)>;

/// Push channel holding its latest value.
///
/// New observers are called immediately with the current value, then on every
/// publication in order. A distinct subject drops publications equal to the
/// value it already holds.
pub struct Subject<T> {
    value: T,
    distinct: bool,
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer<T>)>,
}

impl<T: PartialEq> Subject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            distinct: false,
            next_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn distinct(initial: T) -> Self {
        Self {
            distinct: true,
            ..Self::new(initial)
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Publish `value`. Returns false when a distinct subject dropped it.
    pub fn next(&mut self, value: T) -> bool {
        if self.distinct && self.value == value {
            return false;
        }

        self.value = value;
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.value);
        }
        true
    }

    pub fn subscribe(&mut self, mut observer: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        observer(&self.value);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }
}

impl<T: fmt::Debug> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("value", &self.value)
            .field("distinct", &self.distinct)
            .field("observers", &self.observers.len())
            .finish()
    }
}
