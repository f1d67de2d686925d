//! Group nodes and membership edges.
//!
//! Every group becomes a node. Each element naming a group in its
//! `group_ref` gets a membership edge `group::member` from the group node to
//! its own node. Members without a node keep their `group_ref` but get no
//! edge.
//!
//! Memberships are admitted in document order into a containment graph; one
//! that would close a cycle is omitted.

use std::collections::HashMap;

use log::{trace, warn};
use petgraph::{
    algo::has_path_connecting,
    graph::{DiGraph, NodeIndex},
};

use pathweave_core::{identifier::Id, model::ElementKind};

use super::{Batch, Conversion, Converter, EdgeRole, GraphEdge, KnownKind, NodeRole, Target};
use crate::{
    attributes::{AttributeBag, HostAttribute, INTERACTION},
    registry::IdentityRegistry,
    warning::{ConversionWarning, ReferenceField},
    wrapper::GROUP_EDGE_TYPE,
};

/// A membership edge between a group node and a member node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    /// Host edge id, `group::member` unless taken
    pub id: Id,
    pub group: Id,
    pub member: Id,
}

/// Group containment graph used for cycle detection.
struct Containment {
    graph: DiGraph<Id, ()>,
    node_id_map: HashMap<Id, NodeIndex>,
    detect_cycles: bool,
}

impl Containment {
    fn new(detect_cycles: bool) -> Self {
        Self {
            graph: DiGraph::new(),
            node_id_map: HashMap::new(),
            detect_cycles,
        }
    }

    fn node(&mut self, id: Id) -> NodeIndex {
        *self
            .node_id_map
            .entry(id)
            .or_insert_with(|| self.graph.add_node(id))
    }

    /// Records `group` containing `member` unless that closes a cycle.
    ///
    /// Returns `false` for a rejected membership.
    fn admit(&mut self, group: Id, member: Id) -> bool {
        let group_idx = self.node(group);
        let member_idx = self.node(member);
        if self.detect_cycles
            && (group == member || has_path_connecting(&self.graph, member_idx, group_idx, None))
        {
            return false;
        }
        self.graph.add_edge(group_idx, member_idx, ());
        true
    }
}

impl Converter<'_> {
    /// Emits group nodes and membership edges.
    pub(super) fn expand_groups(
        &self,
        batch: &Batch,
        registry: &mut IdentityRegistry,
        conversion: &mut Conversion,
    ) {
        for group in batch
            .elements
            .iter()
            .filter(|element| matches!(element.kind(), ElementKind::Group))
        {
            let reused = self.existing_host_nodes.contains(&group.id());
            let center = group.geometry().center().unwrap_or_default();
            self.bind_node(conversion, group.id(), NodeRole::Group { reused }, center);
        }

        let mut containment = Containment::new(self.config.detect_group_cycles());
        for (group, member) in &self.existing_memberships {
            containment.admit(*group, *member);
        }

        for element in &batch.elements {
            let Some(group) = element.group_ref() else {
                continue;
            };
            let member = element.id();

            let is_group = match self.target(batch, group) {
                Some(Target::Batch(index)) => {
                    matches!(batch.elements[index].kind(), ElementKind::Group)
                }
                Some(Target::Known(kind)) => kind == KnownKind::Group,
                None => false,
            };
            if !is_group {
                warn!(element = member.to_string(), group = group.to_string(); "Unresolved groupRef");
                conversion.warnings.push(ConversionWarning::UnresolvedReference {
                    element: member,
                    field: ReferenceField::GroupRef,
                    target: group,
                });
                continue;
            }

            if conversion.wrappers.node_of(member).is_none() {
                trace!(element = member.to_string(); "Member without node, no membership edge");
                continue;
            }

            if !containment.admit(group, member) {
                warn!(group = group.to_string(), member = member.to_string(); "Membership would form a cycle");
                conversion
                    .warnings
                    .push(ConversionWarning::InvalidGroupTopology { group, member });
                continue;
            }

            let id = registry.reserve(group.create_nested(member));
            let mut attributes = AttributeBag::new();
            attributes.insert(INTERACTION.to_string(), HostAttribute::visible(GROUP_EDGE_TYPE));
            conversion.edges.push(GraphEdge {
                id,
                source: group,
                target: member,
                role: EdgeRole::Membership { group },
                attributes,
            });
            conversion.memberships.push(Membership { id, group, member });
        }
    }
}
