//! State changes caused by stochastic reactions and by completed fixed events.

use super::{
    events::FixedEventKind,
    propensity::{PropensityTable, ReactionChannel},
    state::{CellState, ChromatinTransition},
};
use crate::error::GrnforgeError;
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::{Environment, SignalPhase},
    genotype::{GeneId, Genotype},
};
use rand::Rng;

/// Read-only inputs shared by all handlers of one run.
#[derive(Clone, Copy)]
pub struct ReactionContext<'a> {
    pub genotype: &'a Genotype,
    pub environment: &'a Environment,
    pub config: &'a EngineConfig,
}

/// Moves one nuclear mRNA into the cytoplasm, where it starts loading ribosomes.
pub fn transport_event(ctx: ReactionContext, state: &mut CellState, gene: GeneId) -> Result<(), GrnforgeError> {
    let mrna = &mut state.mrna[gene];
    if mrna.nuclear == 0 {
        return Err(GrnforgeError::EmptyMrnaPool { gene, pool: "nuclear" });
    }
    mrna.nuclear -= 1;
    mrna.translation_delay += 1;
    let ready_at = state.time + ctx.config.timing.translation_time;
    state.events.schedule(FixedEventKind::TranslationInitEnd, Some(gene), ready_at)?;
    Ok(())
}

/// Decays one cytoplasmic mRNA, chosen uniformly among translating mRNAs and those still
/// in the translation delay. Decaying a delayed mRNA cancels its pending event.
pub fn mrna_decay_event<R: Rng + ?Sized>(
    ctx: ReactionContext,
    state: &mut CellState,
    gene: GeneId,
    rng: &mut R,
) -> Result<(), GrnforgeError> {
    let pool = state.mrna[gene].in_cytoplasm();
    if pool == 0 {
        return Err(GrnforgeError::EmptyMrnaPool { gene, pool: "cytoplasmic" });
    }
    let pick = rng.gen_range(0..pool);
    let cytoplasmic = state.mrna[gene].cytoplasmic;
    if pick < cytoplasmic {
        state.mrna[gene].cytoplasmic -= 1;
        state.update_kinetics(ctx.genotype, gene);
    } else {
        let occurrence = (pick - cytoplasmic) as usize;
        state
            .events
            .remove_nth(FixedEventKind::TranslationInitEnd, gene, occurrence)
            .ok_or(GrnforgeError::MissingFixedEvent {
                kind: FixedEventKind::TranslationInitEnd,
                gene,
                occurrence,
            })?;
        state.mrna[gene].translation_delay -= 1;
    }
    Ok(())
}

/// Starts a transcript on a promoter with an assembled PIC. The promoter keeps its PIC.
pub fn transcription_init_event(ctx: ReactionContext, state: &mut CellState, gene: GeneId) -> Result<(), GrnforgeError> {
    state.mrna[gene].transcribing += 1;
    let done_at = state.time + ctx.config.timing.transcription_time;
    state.events.schedule(FixedEventKind::TranscriptionEnd, Some(gene), done_at)?;
    Ok(())
}

/// Samples and executes one stochastic reaction at the current cell time.
pub fn do_gillespie_event<R: Rng + ?Sized>(
    ctx: ReactionContext,
    state: &mut CellState,
    table: &PropensityTable,
    rng: &mut R,
) -> Result<Option<(ReactionChannel, GeneId)>, GrnforgeError> {
    let Some(channel) = table.pick_channel(rng) else {
        return Ok(None);
    };
    let Some(gene) = table.pick_gene(channel, rng) else {
        return Ok(None);
    };

    match channel {
        ReactionChannel::Transport => transport_event(ctx, state, gene)?,
        ReactionChannel::MrnaDecay => mrna_decay_event(ctx, state, gene, rng)?,
        ReactionChannel::Acetylation => state.transition(gene, ChromatinTransition::Acetylation)?,
        ReactionChannel::Deacetylation => state.transition(gene, ChromatinTransition::Deacetylation)?,
        ReactionChannel::PicAssembly => state.transition(gene, ChromatinTransition::PicAssembly)?,
        ReactionChannel::PicDisassembly => state.transition(gene, ChromatinTransition::PicDisassembly)?,
        ReactionChannel::TranscriptionInit => transcription_init_event(ctx, state, gene)?,
    }
    Ok(Some((channel, gene)))
}

/// A transcript is complete and waits in the nucleus for export.
pub fn end_transcription(state: &mut CellState, gene: GeneId) -> Result<(), GrnforgeError> {
    let mrna = &mut state.mrna[gene];
    if mrna.transcribing == 0 {
        return Err(GrnforgeError::EmptyMrnaPool { gene, pool: "transcribing" });
    }
    mrna.transcribing -= 1;
    mrna.nuclear += 1;
    Ok(())
}

/// An mRNA finished loading ribosomes and starts producing protein.
pub fn end_translation_init(ctx: ReactionContext, state: &mut CellState, gene: GeneId) -> Result<(), GrnforgeError> {
    let mrna = &mut state.mrna[gene];
    if mrna.translation_delay == 0 {
        return Err(GrnforgeError::EmptyMrnaPool { gene, pool: "translation-delay" });
    }
    mrna.translation_delay -= 1;
    mrna.cytoplasmic += 1;
    state.update_kinetics(ctx.genotype, gene);
    Ok(())
}

/// Switches the environment to `phase` and schedules the switch back.
pub fn start_signal_phase(ctx: ReactionContext, state: &mut CellState, phase: SignalPhase) -> Result<(), GrnforgeError> {
    state.set_signal(ctx.genotype, ctx.environment, phase);
    schedule_phase_end(ctx, state)
}

/// Schedules the end of the phase the cell is currently in.
pub fn schedule_phase_end(ctx: ReactionContext, state: &mut CellState) -> Result<(), GrnforgeError> {
    let current = state.signal_phase;
    let duration = ctx.environment.phase(current).duration;
    if !(duration > 0.0) || !duration.is_finite() {
        return Ok(());
    }
    let kind = match current.other() {
        SignalPhase::A => FixedEventKind::SignalAStart,
        SignalPhase::B => FixedEventKind::SignalBStart,
    };
    state.events.schedule(kind, None, state.time + duration)?;
    Ok(())
}
