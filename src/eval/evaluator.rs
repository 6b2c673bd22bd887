use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::array_modifier::params::{StepLeaves, read_params};
use crate::array_modifier::{
    ComputedFields, IndexTransform, compose_index_transforms, place_instances,
};
use crate::eval::env::FrameEnv;
use crate::eval::options::EvalOptions;
use crate::eval::output::{FrameOutput, LayerTransforms, PropertyValue};
use crate::eval::time::{TimeMap, effective_frames, local_frame};
use crate::eval::transform::TransformFields;
use crate::expression::{BuiltinExpressionEvaluator, ExpressionEvaluator};
use crate::flow::schedule::schedule_graphs;
use crate::flow::{
    CompositionError, CompositionErrorKind, FlowGraph, GraphOutcome, evaluate_graph,
};
use crate::foundation::error::{PropelError, PropelResult};
use crate::foundation::ids::{CompositionId, FlowGraphId, PropertyId};
use crate::scene::model::{Composition, Layer, Property, Scene};
use crate::value::types::Value;

static BUILTIN_EXPRESSIONS: BuiltinExpressionEvaluator = BuiltinExpressionEvaluator;

/// Resolves every property of a composition at a frame.
///
/// Evaluation runs in phases. Raw values (static or keyframed) are resolved for
/// every reachable layer first; layer graphs then run in dependency waves and
/// overwrite computed values; transforms and array modifiers are composed from
/// the computed values; finally nested compositions are evaluated once per
/// instance of the layer that places them.
pub struct Evaluator<'a> {
    scene: &'a Scene,
    options: EvalOptions,
    expressions: &'a dyn ExpressionEvaluator,
}

/// Errors and frame-dependent writes collected outside the main table.
#[derive(Default)]
struct Report {
    errors: Vec<CompositionError>,
    frame_dependent: BTreeSet<PropertyId>,
}

impl Report {
    fn absorb(&mut self, outcome: GraphOutcome) {
        for err in outcome.errors {
            if !self.errors.contains(&err) {
                self.errors.push(err);
            }
        }
        self.frame_dependent.extend(outcome.frame_dependent);
    }
}

impl<'a> Evaluator<'a> {
    /// Validate `scene` and build an evaluator using the built-in expression language.
    pub fn new(scene: &'a Scene, options: EvalOptions) -> PropelResult<Self> {
        scene.validate()?;
        Ok(Self {
            scene,
            options,
            expressions: &BUILTIN_EXPRESSIONS,
        })
    }

    /// Replace the evaluator used by `expr` nodes.
    pub fn with_expressions(mut self, expressions: &'a dyn ExpressionEvaluator) -> Self {
        self.expressions = expressions;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluate `composition` at `frame`.
    ///
    /// Graph failures are collected in [`FrameOutput::errors`]; only structural
    /// problems (missing `Transform`, unsupported modifier policy, nesting
    /// cycles, dangling ids) and non-finite frames fail the call.
    #[tracing::instrument(skip(self, composition), fields(composition = %composition))]
    pub fn eval_frame(
        &self,
        composition: &CompositionId,
        frame: f64,
    ) -> PropelResult<FrameOutput> {
        if !frame.is_finite() {
            return Err(PropelError::validation(format!("frame {frame} is not finite")));
        }
        let mut stack = Vec::new();
        self.eval_composition(composition, frame, None, &mut stack)
    }

    fn eval_composition(
        &self,
        comp_id: &CompositionId,
        frame: f64,
        instance_index: Option<usize>,
        stack: &mut Vec<CompositionId>,
    ) -> PropelResult<FrameOutput> {
        if stack.contains(comp_id) {
            return Err(PropelError::structure(format!(
                "composition nesting cycle through '{comp_id}'"
            )));
        }
        let comp = self.scene.composition(comp_id)?;
        stack.push(comp_id.clone());

        let time = effective_frames(self.scene, comp_id, frame, self.options.recursive)?;

        let mut raw = BTreeMap::new();
        for (layer_id, layer_frame) in &time.layers {
            let layer = self.scene.layer(layer_id)?;
            for leaf in self.scene.layer_leaves(layer) {
                raw.insert(leaf.id.clone(), self.raw_value(leaf, *layer_frame)?);
            }
        }
        let mut computed = raw.clone();
        let mut report = Report::default();

        self.run_layer_graphs(comp, &time, instance_index, &mut computed, &mut report)?;

        let mut transforms = BTreeMap::new();
        let mut modifier_report = Report::default();
        {
            let env = FrameEnv {
                scene: self.scene,
                composition: comp_id,
                frames: &time.compositions,
                values: &computed,
                frame_dependent: &report.frame_dependent,
                array_index: instance_index,
                expressions: self.expressions,
            };
            for layer_id in &comp.layers {
                let layer = self.scene.layer(layer_id)?;
                let placed = self.layer_transforms(env, layer, &mut modifier_report)?;
                transforms.insert(layer_id.clone(), placed);
            }
        }
        report.errors.extend(modifier_report.errors);
        report.frame_dependent.extend(modifier_report.frame_dependent);

        let mut composition_layers = BTreeMap::new();
        if self.options.recursive {
            for layer_id in &comp.layers {
                let layer = self.scene.layer(layer_id)?;
                let Some(child) = self.scene.nested_composition(layer) else {
                    continue;
                };
                let instances = transforms.get(layer_id).map_or(1, |t| t.transform.len());
                let child_frame = local_frame(frame, layer.index);
                let mut outputs = Vec::with_capacity(instances);
                for i in 0..instances {
                    outputs.push(self.eval_composition(child, child_frame, Some(i), stack)?);
                }
                composition_layers.insert(layer_id.clone(), outputs);
            }
        }
        stack.pop();

        let mut properties = BTreeMap::new();
        for layer_id in &comp.layers {
            let layer = self.scene.layer(layer_id)?;
            for leaf in self.scene.layer_leaves(layer) {
                let Some(raw) = raw.get(&leaf.id) else {
                    continue;
                };
                let value = computed.get(&leaf.id).unwrap_or(raw);
                properties.insert(leaf.id.clone(), PropertyValue {
                    raw: raw.clone(),
                    computed: value.clone(),
                });
            }
        }

        tracing::debug!(
            composition = %comp_id,
            frame,
            properties = properties.len(),
            errors = report.errors.len(),
            "composition evaluated"
        );
        Ok(FrameOutput {
            composition_id: comp_id.clone(),
            frame,
            instance_index,
            properties,
            transforms,
            composition_layers,
            frame_dependent: report.frame_dependent,
            errors: report.errors,
        })
    }

    fn raw_value(&self, leaf: &Property, frame: f64) -> PropelResult<Value> {
        let Some(timeline_id) = &leaf.timeline_id else {
            return Ok(leaf.value.clone());
        };
        let timeline = self.scene.timelines.get(timeline_id).ok_or_else(|| {
            PropelError::structure(format!(
                "property '{}' references unknown timeline '{timeline_id}'",
                leaf.id
            ))
        })?;
        Ok(Value::Number(timeline.value_at(frame)))
    }

    /// Run the graphs of `comp`'s own layers, writer waves before reader waves.
    fn run_layer_graphs(
        &self,
        comp: &Composition,
        time: &TimeMap,
        instance_index: Option<usize>,
        computed: &mut BTreeMap<PropertyId, Value>,
        report: &mut Report,
    ) -> PropelResult<()> {
        let mut graphs: Vec<&FlowGraph> = Vec::new();
        for layer_id in &comp.layers {
            if let Some(graph_id) = &self.scene.layer(layer_id)?.graph_id {
                graphs.push(self.scene.flow_graph(graph_id)?);
            }
        }
        if graphs.is_empty() {
            return Ok(());
        }
        let by_id: BTreeMap<&FlowGraphId, &FlowGraph> =
            graphs.iter().map(|g| (&g.id, *g)).collect();

        let schedule = schedule_graphs(self.scene, &graphs);
        tracing::debug!(
            waves = schedule.waves.len(),
            cyclic = schedule.cyclic.len(),
            "layer graphs scheduled"
        );
        let mut waves: Vec<(&[FlowGraphId], bool)> =
            schedule.waves.iter().map(|w| (w.as_slice(), false)).collect();
        if !schedule.cyclic.is_empty() {
            waves.push((schedule.cyclic.as_slice(), true));
        }

        for (wave, cyclic) in waves {
            let members: Vec<&FlowGraph> =
                wave.iter().filter_map(|id| by_id.get(id).copied()).collect();
            let env = FrameEnv {
                scene: self.scene,
                composition: &comp.id,
                frames: &time.compositions,
                values: computed,
                frame_dependent: &report.frame_dependent,
                array_index: instance_index,
                expressions: self.expressions,
            };
            let parallel = self.options.parallel_graphs && members.len() > 1;
            let outcomes: Vec<GraphOutcome> = if parallel {
                members
                    .par_iter()
                    .map(|g| evaluate_graph(self.scene, g, &env))
                    .collect()
            } else {
                members
                    .iter()
                    .map(|g| evaluate_graph(self.scene, g, &env))
                    .collect()
            };

            for mut outcome in outcomes {
                if cyclic {
                    outcome.errors.push(CompositionError::graph(
                        &outcome.graph_id,
                        CompositionErrorKind::GraphCycle {
                            graphs: wave.to_vec(),
                        },
                    ));
                }
                for (id, value) in outcome.writes.drain(..) {
                    computed.insert(id, value);
                }
                report.absorb(outcome);
            }
        }
        Ok(())
    }

    fn layer_transforms(
        &self,
        env: FrameEnv<'_>,
        layer: &Layer,
        report: &mut Report,
    ) -> PropelResult<LayerTransforms> {
        let read = |id: &PropertyId| env.values.get(id).cloned();
        let fields = TransformFields::read(self.scene, layer, read)?;
        let base = fields.to_affine();

        let mut transform = vec![base];
        let mut index_transforms = Vec::new();
        for modifier in self.scene.array_modifiers(layer) {
            let params = read_params(self.scene, modifier, read, self.options.max_array_count)?;
            let leaves = StepLeaves::of(self.scene, modifier);
            let (steps, computed) = match &modifier.graph_id {
                None => (vec![leaves.read(read); params.count], ComputedFields::default()),
                Some(graph_id) => {
                    let graph = self.scene.flow_graph(graph_id)?;
                    self.run_index_graph(env, graph, &leaves, params.count, report)
                }
            };
            let instances = compose_index_transforms(&steps, computed, &params);
            transform = place_instances(&transform, &instances, &params);
            index_transforms.push(instances.iter().map(|i| i.fields).collect());
        }

        Ok(LayerTransforms {
            base,
            opacity: fields.opacity,
            transform,
            index_transforms,
        })
    }

    /// Evaluate an array-modifier graph once per index.
    ///
    /// Each index writes into its own table; a step field present in any table
    /// counts as computed.
    fn run_index_graph(
        &self,
        env: FrameEnv<'_>,
        graph: &FlowGraph,
        leaves: &StepLeaves,
        count: usize,
        report: &mut Report,
    ) -> (Vec<IndexTransform>, ComputedFields) {
        let eval_index = |i: usize| {
            let outcome = evaluate_graph(self.scene, graph, &env.for_index(i));
            let table: BTreeMap<PropertyId, Value> = outcome.writes.iter().cloned().collect();
            let step = leaves.read(|id| table.get(id).or_else(|| env.values.get(id)).cloned());
            (step, leaves.computed_in(&table), outcome)
        };
        let per_index: Vec<(IndexTransform, ComputedFields, GraphOutcome)> =
            if self.options.parallel_graphs && count > 1 {
                (0..count).into_par_iter().map(eval_index).collect()
            } else {
                (0..count).map(eval_index).collect()
            };

        let mut computed = ComputedFields::default();
        let mut steps = Vec::with_capacity(count);
        for (step, fields, outcome) in per_index {
            steps.push(step);
            computed = computed.union(fields);
            report.absorb(outcome);
        }
        (steps, computed)
    }
}
