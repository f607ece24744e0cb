//! Behaviour every [`PriorityQueue`](crate::PriorityQueue) implementation has to show. Each
//! implementation runs it from its own tests through a [`suite::Tester`].
