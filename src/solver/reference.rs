//! Deterministic in-memory reference backend
//!
//! [`ReferenceSolver`] implements the [`ReactionSolver`] seam without any
//! chemistry: its `advance` applies a fixed, smooth relaxation so that
//! state changes are observable, bounded and bit-reproducible. It exists
//! for the test suite, the benchmarks, and as a template for backends that
//! bind a real solver library.
//!
//! Its script grammar *is* its transfer grammar: keyword-tagged `*_RAW`
//! blocks, one per reactant category, so a dumped cell replays through
//! [`ReactionSolver::run_script`] unchanged. Floating-point values are
//! serialized with Rust's shortest round-trip formatting, which keeps
//! dump → replay exact to the bit.
//!
//! ```text
//! SOLUTION_RAW 1
//!     -temp 25
//!     -total_h 110.0124
//!     -totals
//!         Ca 0.0012
//!         Cl 0.0024
//! EQUILIBRIUM_PHASES_RAW 1
//!     -component Calcite
//!         -moles 0.001
//!         -si 0
//! END
//! ```
//!
//! The database grammar declares `MASTER_SPECIES` (in pre-sorted order;
//! that ordering is the contract the valence expansion relies on) and
//! `SPECIES` blocks.

use std::collections::BTreeMap;

use crate::chem::{
    EquilibriumPhase, EquilibriumState, ExchangeComponent, ExchangeState, KineticsComponent,
    KineticsState, MasterTable, NameDouble, SolutionState, SurfaceCharge, SurfaceComponent,
    SurfaceState,
};
use crate::error::{Error, Result};
use crate::solver::{ReactionSolver, SolverFactory, SolverKnobs};
use crate::CellId;

// Relaxation constants of the synthetic advance. Values are small so that
// realistic time steps produce visible but bounded drift.
const KINETIC_RATE_SCALE: f64 = 1.0e-6;
const SI_RELAXATION_SCALE: f64 = 1.0e-4;
const SI_MOLE_TRANSFER: f64 = 1.0e-3;
const PE_RELAXATION_SCALE: f64 = 1.0e-5;
const PE_REST_VALUE: f64 = 4.0;

/// One cell's full reactant state.
#[derive(Debug, Clone, Default)]
struct CellState {
    solution: Option<SolutionState>,
    exchange: Option<ExchangeState>,
    kinetics: Option<KineticsState>,
    equilibrium: Option<EquilibriumState>,
    surface: Option<SurfaceState>,
}

/// Deterministic in-memory solver.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSolver {
    cells: BTreeMap<CellId, CellState>,
    master: MasterTable,
    species: Vec<String>,
    knobs: SolverKnobs,
    selected_output: Option<String>,
}

impl ReferenceSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Factory producing fresh [`ReferenceSolver`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSolverFactory;

impl SolverFactory for ReferenceSolverFactory {
    fn create(&self) -> Box<dyn ReactionSolver> {
        Box::new(ReferenceSolver::new())
    }
}

// =================================================================================================
// ReactionSolver implementation
// =================================================================================================

impl ReactionSolver for ReferenceSolver {
    fn load_database(&mut self, database: &str) -> Result<()> {
        let mut master = Vec::new();
        let mut species = Vec::new();
        let mut section: Option<&str> = None;

        for (number, line) in database.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if !line.starts_with(char::is_whitespace) {
                section = match trimmed {
                    "MASTER_SPECIES" => Some("master"),
                    "SPECIES" => Some("species"),
                    "END" => None,
                    other => {
                        return Err(Error::Script(format!(
                            "database line {}: unknown keyword `{other}`",
                            number + 1
                        )))
                    }
                };
                continue;
            }

            let name = trimmed
                .split_whitespace()
                .next()
                .expect("non-empty trimmed line has a token");
            match section {
                Some("master") => master.push(name.to_string()),
                Some("species") => species.push(name.to_string()),
                _ => {
                    return Err(Error::Script(format!(
                        "database line {}: entry outside of a section",
                        number + 1
                    )))
                }
            }
        }

        self.master = MasterTable::new(master);
        self.species = species;
        Ok(())
    }

    fn run_script(&mut self, script: &str) -> Result<()> {
        // Parse into scratch state first so a malformed script never
        // leaves the instance half-modified.
        let parsed = Parser::new(script).parse()?;

        for (cell, update) in parsed.cells {
            let state = self.cells.entry(cell).or_default();
            if let Some(solution) = update.solution {
                state.solution = Some(solution);
            }
            if let Some(exchange) = update.exchange {
                state.exchange = Some(exchange);
            }
            if let Some(kinetics) = update.kinetics {
                state.kinetics = Some(kinetics);
            }
            if let Some(equilibrium) = update.equilibrium {
                state.equilibrium = Some(equilibrium);
            }
            if let Some(surface) = update.surface {
                state.surface = Some(surface);
            }
        }

        if let Some(knobs) = parsed.knobs {
            self.knobs = knobs;
        }

        if !parsed.selected_headings.is_empty() {
            let headings = parsed.selected_headings.join("\t");
            let values = vec!["0"; parsed.selected_headings.len()].join("\t");
            self.selected_output = Some(format!("{headings}\n{values}\n"));
        }

        Ok(())
    }

    fn advance(&mut self, cell: CellId, time_step: f64) -> Result<()> {
        if time_step < 0.0 {
            return Err(Error::InvalidArgument(
                "time step must be non-negative".to_string(),
            ));
        }
        let state = self
            .cells
            .get_mut(&cell)
            .ok_or(Error::UnknownCell(cell))?;

        // Surface diffuse-layer state materializes on the first advance,
        // regardless of the step length.
        if let Some(surface) = state.surface.as_mut() {
            for charge in &mut surface.charges {
                if charge.diffuse_layer_totals.is_empty() {
                    charge
                        .diffuse_layer_totals
                        .insert("H", charge.mass_water * 1.0e-6);
                    charge
                        .diffuse_layer_totals
                        .insert("O", charge.mass_water * 5.0e-7);
                }
            }
        }

        if let Some(kinetics) = state.kinetics.as_mut() {
            for comp in &mut kinetics.components {
                let rate = comp.parameters.first().copied().unwrap_or(0.0);
                comp.moles *= (-rate * time_step * KINETIC_RATE_SCALE).exp();
            }
        }

        if let Some(equilibrium) = state.equilibrium.as_mut() {
            for phase in &mut equilibrium.phases {
                let relaxed = phase.saturation_index * (-time_step * SI_RELAXATION_SCALE).exp();
                phase.moles += (phase.saturation_index - relaxed) * SI_MOLE_TRANSFER;
                phase.saturation_index = relaxed;
            }
        }

        if let Some(solution) = state.solution.as_mut() {
            let pull = 1.0 - (-time_step * PE_RELAXATION_SCALE).exp();
            solution.pe += (PE_REST_VALUE - solution.pe) * pull;
        }

        Ok(())
    }

    fn reinitialize_solution(&mut self, cell: CellId) -> Result<()> {
        // A real backend rebuilds its internal solution representation
        // here; the reference state is already normalized.
        match self.cells.get(&cell) {
            Some(state) if state.solution.is_some() => Ok(()),
            _ => Err(Error::UnknownCell(cell)),
        }
    }

    fn dump_cell(&self, cell: CellId) -> Result<String> {
        let state = self.cells.get(&cell).ok_or(Error::UnknownCell(cell))?;
        Ok(serialize_cell(cell, state))
    }

    fn knobs(&self) -> SolverKnobs {
        self.knobs
    }

    fn apply_knobs(&mut self, knobs: &SolverKnobs) {
        self.knobs = *knobs;
    }

    fn cell_ids(&self) -> Vec<CellId> {
        self.cells.keys().copied().collect()
    }

    fn solution(&self, cell: CellId) -> Option<&SolutionState> {
        self.cells.get(&cell)?.solution.as_ref()
    }

    fn solution_mut(&mut self, cell: CellId) -> Option<&mut SolutionState> {
        self.cells.get_mut(&cell)?.solution.as_mut()
    }

    fn exchange(&self, cell: CellId) -> Option<&ExchangeState> {
        self.cells.get(&cell)?.exchange.as_ref()
    }

    fn exchange_mut(&mut self, cell: CellId) -> Option<&mut ExchangeState> {
        self.cells.get_mut(&cell)?.exchange.as_mut()
    }

    fn kinetics(&self, cell: CellId) -> Option<&KineticsState> {
        self.cells.get(&cell)?.kinetics.as_ref()
    }

    fn kinetics_mut(&mut self, cell: CellId) -> Option<&mut KineticsState> {
        self.cells.get_mut(&cell)?.kinetics.as_mut()
    }

    fn equilibrium(&self, cell: CellId) -> Option<&EquilibriumState> {
        self.cells.get(&cell)?.equilibrium.as_ref()
    }

    fn equilibrium_mut(&mut self, cell: CellId) -> Option<&mut EquilibriumState> {
        self.cells.get_mut(&cell)?.equilibrium.as_mut()
    }

    fn surface(&self, cell: CellId) -> Option<&SurfaceState> {
        self.cells.get(&cell)?.surface.as_ref()
    }

    fn surface_mut(&mut self, cell: CellId) -> Option<&mut SurfaceState> {
        self.cells.get_mut(&cell)?.surface.as_mut()
    }

    fn master_table(&self) -> &MasterTable {
        &self.master
    }

    fn species_names(&self) -> &[String] {
        &self.species
    }

    fn selected_output_text(&self) -> Option<&str> {
        self.selected_output.as_deref()
    }
}

// =================================================================================================
// Serialization (dump format)
// =================================================================================================

fn serialize_cell(cell: CellId, state: &CellState) -> String {
    let mut out = String::new();

    if let Some(solution) = &state.solution {
        out.push_str(&format!("SOLUTION_RAW {cell}\n"));
        out.push_str(&format!("    -total_h {}\n", solution.total_h));
        out.push_str(&format!("    -total_o {}\n", solution.total_o));
        out.push_str(&format!("    -cb {}\n", solution.charge_balance));
        out.push_str(&format!("    -temp {}\n", solution.temperature));
        out.push_str(&format!("    -pressure {}\n", solution.pressure));
        out.push_str(&format!("    -volume {}\n", solution.volume));
        out.push_str(&format!("    -ph {}\n", solution.ph));
        out.push_str(&format!("    -pe {}\n", solution.pe));
        serialize_totals(&mut out, "totals", &solution.totals, 4);
    }

    if let Some(exchange) = &state.exchange {
        out.push_str(&format!("EXCHANGE_RAW {cell}\n"));
        for comp in &exchange.components {
            out.push_str(&format!("    -component {}\n", comp.formula));
            out.push_str(&format!("        -cb {}\n", comp.charge_balance));
            out.push_str(&format!("        -la {}\n", comp.log_activity));
            out.push_str(&format!(
                "        -phase_proportion {}\n",
                comp.phase_proportion
            ));
            out.push_str(&format!("        -formula_z {}\n", comp.formula_charge));
            serialize_totals(&mut out, "totals", &comp.totals, 8);
        }
    }

    if let Some(kinetics) = &state.kinetics {
        out.push_str(&format!("KINETICS_RAW {cell}\n"));
        for comp in &kinetics.components {
            out.push_str(&format!("    -component {}\n", comp.rate_name));
            out.push_str(&format!("        -m {}\n", comp.moles));
            if !comp.parameters.is_empty() {
                let params: Vec<String> =
                    comp.parameters.iter().map(|p| p.to_string()).collect();
                out.push_str(&format!("        -params {}\n", params.join(" ")));
            }
        }
    }

    if let Some(equilibrium) = &state.equilibrium {
        out.push_str(&format!("EQUILIBRIUM_PHASES_RAW {cell}\n"));
        for phase in &equilibrium.phases {
            out.push_str(&format!("    -component {}\n", phase.name));
            out.push_str(&format!("        -moles {}\n", phase.moles));
            out.push_str(&format!("        -si {}\n", phase.saturation_index));
        }
    }

    if let Some(surface) = &state.surface {
        out.push_str(&format!("SURFACE_RAW {cell}\n"));
        for comp in &surface.components {
            out.push_str(&format!("    -component {}\n", comp.formula));
            out.push_str(&format!("        -moles {}\n", comp.moles));
            out.push_str(&format!("        -la {}\n", comp.log_activity));
            out.push_str(&format!("        -cb {}\n", comp.charge_balance));
            serialize_totals(&mut out, "totals", &comp.totals, 8);
        }
        for charge in &surface.charges {
            out.push_str(&format!("    -charge {}\n", charge.name));
            out.push_str(&format!("        -area {}\n", charge.specific_area));
            out.push_str(&format!("        -grams {}\n", charge.grams));
            out.push_str(&format!("        -cb {}\n", charge.charge_balance));
            out.push_str(&format!("        -mass_water {}\n", charge.mass_water));
            out.push_str(&format!("        -la_psi {}\n", charge.la_psi));
            serialize_totals(&mut out, "dl_totals", &charge.diffuse_layer_totals, 8);
        }
    }

    out.push_str("END\n");
    out
}

fn serialize_totals(out: &mut String, directive: &str, totals: &NameDouble, indent: usize) {
    if totals.is_empty() {
        return;
    }
    let pad = " ".repeat(indent);
    out.push_str(&format!("{pad}-{directive}\n"));
    for (name, value) in totals.iter() {
        out.push_str(&format!("{pad}    {name} {value}\n"));
    }
}

// =================================================================================================
// Parsing (script / dump format)
// =================================================================================================

#[derive(Debug, Default)]
struct ParsedScript {
    cells: BTreeMap<CellId, CellState>,
    knobs: Option<SolverKnobs>,
    selected_headings: Vec<String>,
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(script: &'a str) -> Self {
        Parser {
            lines: script.lines().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<ParsedScript> {
        let mut parsed = ParsedScript::default();

        while let Some(line) = self.peek() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.pos += 1;
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                return Err(self.error("data line outside of a block"));
            }

            let mut tokens = trimmed.split_whitespace();
            let keyword = tokens.next().expect("non-empty line has a token");
            match keyword {
                "END" => {
                    self.pos += 1;
                }
                "KNOBS" => {
                    self.pos += 1;
                    parsed.knobs = Some(self.parse_knobs()?);
                }
                "SELECTED_OUTPUT" | "USER_PUNCH" => {
                    self.pos += 1;
                    self.parse_selected_output(&mut parsed.selected_headings)?;
                }
                "SOLUTION_RAW" | "EXCHANGE_RAW" | "KINETICS_RAW" | "EQUILIBRIUM_PHASES_RAW"
                | "SURFACE_RAW" => {
                    let cell = self.parse_cell_id(tokens.next())?;
                    self.pos += 1;
                    let state = parsed.cells.entry(cell).or_default();
                    match keyword {
                        "SOLUTION_RAW" => state.solution = Some(self.parse_solution()?),
                        "EXCHANGE_RAW" => state.exchange = Some(self.parse_exchange()?),
                        "KINETICS_RAW" => state.kinetics = Some(self.parse_kinetics()?),
                        "EQUILIBRIUM_PHASES_RAW" => {
                            state.equilibrium = Some(self.parse_equilibrium()?)
                        }
                        _ => state.surface = Some(self.parse_surface()?),
                    }
                }
                other => {
                    return Err(self.error(&format!("unknown keyword `{other}`")));
                }
            }
        }

        Ok(parsed)
    }

    // ---- block parsers ----------------------------------------------------

    fn parse_solution(&mut self) -> Result<SolutionState> {
        let mut solution = SolutionState::default();
        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "totals" => solution.totals = self.parse_pairs()?,
                "total_h" => solution.total_h = self.parse_number(&rest)?,
                "total_o" => solution.total_o = self.parse_number(&rest)?,
                "cb" => solution.charge_balance = self.parse_number(&rest)?,
                "temp" => solution.temperature = self.parse_number(&rest)?,
                "pressure" => solution.pressure = self.parse_number(&rest)?,
                "volume" => solution.volume = self.parse_number(&rest)?,
                "ph" => solution.ph = self.parse_number(&rest)?,
                "pe" => solution.pe = self.parse_number(&rest)?,
                other => return Err(self.error(&format!("unknown solution directive `{other}`"))),
            }
        }
        Ok(solution)
    }

    fn parse_exchange(&mut self) -> Result<ExchangeState> {
        let mut exchange = ExchangeState::default();
        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "component" => {
                    let formula = self.parse_name(&rest, "exchange component")?;
                    exchange.components.push(ExchangeComponent {
                        formula,
                        ..Default::default()
                    });
                }
                other => {
                    let comp = exchange
                        .components
                        .last_mut()
                        .ok_or_else(|| self.error("directive before any -component"))?;
                    match other {
                        "cb" => comp.charge_balance = self.parse_number(&rest)?,
                        "la" => comp.log_activity = self.parse_number(&rest)?,
                        "phase_proportion" => comp.phase_proportion = self.parse_number(&rest)?,
                        "formula_z" => comp.formula_charge = self.parse_number(&rest)?,
                        "totals" => comp.totals = self.parse_pairs()?,
                        unknown => {
                            return Err(
                                self.error(&format!("unknown exchange directive `{unknown}`"))
                            )
                        }
                    }
                }
            }
        }
        Ok(exchange)
    }

    fn parse_kinetics(&mut self) -> Result<KineticsState> {
        let mut kinetics = KineticsState::default();
        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "component" => {
                    let rate_name = self.parse_name(&rest, "kinetic component")?;
                    kinetics.components.push(KineticsComponent {
                        rate_name,
                        ..Default::default()
                    });
                }
                other => {
                    let comp = kinetics
                        .components
                        .last_mut()
                        .ok_or_else(|| self.error("directive before any -component"))?;
                    match other {
                        "m" => comp.moles = self.parse_number(&rest)?,
                        "params" => {
                            comp.parameters = rest
                                .split_whitespace()
                                .map(|token| {
                                    token.parse::<f64>().map_err(|_| {
                                        self.error(&format!("invalid number `{token}`"))
                                    })
                                })
                                .collect::<Result<Vec<f64>>>()?;
                        }
                        unknown => {
                            return Err(
                                self.error(&format!("unknown kinetics directive `{unknown}`"))
                            )
                        }
                    }
                }
            }
        }
        Ok(kinetics)
    }

    fn parse_equilibrium(&mut self) -> Result<EquilibriumState> {
        let mut equilibrium = EquilibriumState::default();
        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "component" => {
                    let name = self.parse_name(&rest, "equilibrium phase")?;
                    equilibrium.phases.push(EquilibriumPhase {
                        name,
                        ..Default::default()
                    });
                }
                other => {
                    let phase = equilibrium
                        .phases
                        .last_mut()
                        .ok_or_else(|| self.error("directive before any -component"))?;
                    match other {
                        "moles" => phase.moles = self.parse_number(&rest)?,
                        "si" => phase.saturation_index = self.parse_number(&rest)?,
                        unknown => {
                            return Err(
                                self.error(&format!("unknown equilibrium directive `{unknown}`"))
                            )
                        }
                    }
                }
            }
        }
        Ok(equilibrium)
    }

    fn parse_surface(&mut self) -> Result<SurfaceState> {
        enum Target {
            Component,
            Charge,
        }

        let mut surface = SurfaceState::default();
        let mut target = None;

        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "component" => {
                    let formula = self.parse_name(&rest, "surface component")?;
                    surface.components.push(SurfaceComponent {
                        formula,
                        ..Default::default()
                    });
                    target = Some(Target::Component);
                }
                "charge" => {
                    let name = self.parse_name(&rest, "surface charge")?;
                    surface.charges.push(SurfaceCharge {
                        name,
                        ..Default::default()
                    });
                    target = Some(Target::Charge);
                }
                other => match target {
                    Some(Target::Component) => {
                        let comp = surface
                            .components
                            .last_mut()
                            .expect("target tracks a pushed component");
                        match other {
                            "moles" => comp.moles = self.parse_number(&rest)?,
                            "la" => comp.log_activity = self.parse_number(&rest)?,
                            "cb" => comp.charge_balance = self.parse_number(&rest)?,
                            "totals" => comp.totals = self.parse_pairs()?,
                            unknown => {
                                return Err(self
                                    .error(&format!("unknown surface directive `{unknown}`")))
                            }
                        }
                    }
                    Some(Target::Charge) => {
                        let charge = surface
                            .charges
                            .last_mut()
                            .expect("target tracks a pushed charge");
                        match other {
                            "area" => charge.specific_area = self.parse_number(&rest)?,
                            "grams" => charge.grams = self.parse_number(&rest)?,
                            "cb" => charge.charge_balance = self.parse_number(&rest)?,
                            "mass_water" => charge.mass_water = self.parse_number(&rest)?,
                            "la_psi" => charge.la_psi = self.parse_number(&rest)?,
                            "dl_totals" => charge.diffuse_layer_totals = self.parse_pairs()?,
                            unknown => {
                                return Err(self
                                    .error(&format!("unknown surface directive `{unknown}`")))
                            }
                        }
                    }
                    None => {
                        return Err(self.error("directive before any -component or -charge"));
                    }
                },
            }
        }
        Ok(surface)
    }

    fn parse_knobs(&mut self) -> Result<SolverKnobs> {
        let mut knobs = SolverKnobs::default();
        while let Some((directive, rest)) = self.next_directive() {
            match directive.as_str() {
                "iterations" => {
                    knobs.max_iterations = rest
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| self.error("invalid iteration count"))?;
                }
                "convergence_tolerance" => knobs.convergence_tolerance = self.parse_number(&rest)?,
                "tolerance" => knobs.inequality_tolerance = self.parse_number(&rest)?,
                "step_size" => knobs.step_size = self.parse_number(&rest)?,
                "pe_step_size" => knobs.pe_step_size = self.parse_number(&rest)?,
                "diagonal_scale" => knobs.diagonal_scaling = rest.trim() == "true",
                other => return Err(self.error(&format!("unknown knob `{other}`"))),
            }
        }
        Ok(knobs)
    }

    fn parse_selected_output(&mut self, headings: &mut Vec<String>) -> Result<()> {
        while let Some((directive, rest)) = self.next_directive() {
            if directive == "headings" {
                headings.extend(rest.split_whitespace().map(String::from));
            }
            // Other selected-output directives carry no state the
            // reference backend models; they are accepted and skipped.
        }
        Ok(())
    }

    // ---- low-level helpers ------------------------------------------------

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Consumes the next `-directive [rest]` line of the current block.
    /// Stops (without consuming) at the next top-level keyword line.
    fn next_directive(&mut self) -> Option<(String, String)> {
        loop {
            let line = self.peek()?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.pos += 1;
                continue;
            }
            if !line.starts_with(char::is_whitespace) {
                return None; // next block
            }
            if let Some(stripped) = trimmed.strip_prefix('-') {
                self.pos += 1;
                let mut tokens = stripped.splitn(2, char::is_whitespace);
                let directive = tokens.next().unwrap_or_default().to_string();
                let rest = tokens.next().unwrap_or_default().to_string();
                return Some((directive, rest));
            }
            // A bare data line at directive level means a missing
            // -totals introducer; surface it as "no directive" so the
            // block parser reports the position.
            return None;
        }
    }

    /// Parses indented `name value` pair lines following a `-totals`-style
    /// directive.
    fn parse_pairs(&mut self) -> Result<NameDouble> {
        let mut pairs = NameDouble::new();
        while let Some(line) = self.peek() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.pos += 1;
                continue;
            }
            if !line.starts_with(char::is_whitespace) || trimmed.starts_with('-') {
                break;
            }
            let mut tokens = trimmed.split_whitespace();
            let name = tokens
                .next()
                .ok_or_else(|| self.error("missing name in pair line"))?;
            let value = tokens
                .next()
                .ok_or_else(|| self.error(&format!("missing value for `{name}`")))?;
            let value = value
                .parse::<f64>()
                .map_err(|_| self.error(&format!("invalid number `{value}`")))?;
            pairs.insert(name, value);
            self.pos += 1;
        }
        Ok(pairs)
    }

    fn parse_cell_id(&self, token: Option<&str>) -> Result<CellId> {
        token
            .ok_or_else(|| self.error("missing cell number"))?
            .parse::<CellId>()
            .map_err(|_| self.error("invalid cell number"))
    }

    fn parse_number(&self, text: &str) -> Result<f64> {
        text.trim()
            .parse::<f64>()
            .map_err(|_| self.error(&format!("invalid number `{}`", text.trim())))
    }

    fn parse_name(&self, text: &str, what: &str) -> Result<String> {
        let name = text.split_whitespace().next().unwrap_or_default();
        if name.is_empty() {
            return Err(self.error(&format!("missing {what} name")));
        }
        Ok(name.to_string())
    }

    fn error(&self, message: &str) -> Error {
        Error::Script(format!("script line {}: {message}", self.pos + 1))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = "\
MASTER_SPECIES
    Ba
    Ca
    Cl
    Fe
    Fe(2)
    Fe(3)
    H
    H(0)
    H(1)
    O
    O(-2)
    O(0)
    S
    Sr
SPECIES
    X-
    CaX2
    NaX
";

    const SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -total_h 110.0124
    -total_o 55.5062
    -cb 1e-9
    -volume 1
    -totals
        Ca 0.0012
        Cl 0.0024
EQUILIBRIUM_PHASES_RAW 1
    -component Calcite
        -moles 0.001
        -si 0.5
KINETICS_RAW 1
    -component Celestite
        -m 0.002
        -params 0.5 2
END
";

    #[test]
    fn database_parses_master_and_species() {
        let mut solver = ReferenceSolver::new();
        solver.load_database(DATABASE).unwrap();
        assert_eq!(solver.master_table().entries().len(), 14);
        assert_eq!(solver.species_names(), &["X-", "CaX2", "NaX"]);
    }

    #[test]
    fn script_materializes_cell_state() {
        let mut solver = ReferenceSolver::new();
        solver.run_script(SCRIPT).unwrap();

        let solution = solver.solution(1).unwrap();
        assert_eq!(solution.temperature, 25.0);
        assert_eq!(solution.totals.get("Ca"), Some(0.0012));

        let equilibrium = solver.equilibrium(1).unwrap();
        assert_eq!(equilibrium.phases[0].name, "Calcite");
        assert_eq!(equilibrium.phases[0].saturation_index, 0.5);

        let kinetics = solver.kinetics(1).unwrap();
        assert_eq!(kinetics.components[0].parameters, vec![0.5, 2.0]);

        assert!(solver.exchange(1).is_none());
        assert!(solver.surface(1).is_none());
    }

    #[test]
    fn malformed_script_is_fatal_and_atomic() {
        let mut solver = ReferenceSolver::new();
        let err = solver
            .run_script("SOLUTION_RAW 1\n    -temp banana\n")
            .unwrap_err();
        assert!(matches!(err, Error::Script(_)));
        assert!(solver.cell_ids().is_empty());
    }

    #[test]
    fn unknown_keyword_is_a_script_error() {
        let mut solver = ReferenceSolver::new();
        let err = solver.run_script("FROBNICATE 1\n").unwrap_err();
        assert!(err.to_string().contains("FROBNICATE"));
    }

    #[test]
    fn dump_replay_round_trips_exactly() {
        let mut solver = ReferenceSolver::new();
        solver.run_script(SCRIPT).unwrap();
        solver.advance(1, 100.0).unwrap();

        let dump = solver.dump_cell(1).unwrap();

        let mut replayed = ReferenceSolver::new();
        replayed.run_script(&dump).unwrap();

        assert_eq!(solver.solution(1), replayed.solution(1));
        assert_eq!(solver.equilibrium(1), replayed.equilibrium(1));
        assert_eq!(solver.kinetics(1), replayed.kinetics(1));
    }

    #[test]
    fn advance_is_deterministic_and_directional() {
        let mut a = ReferenceSolver::new();
        a.run_script(SCRIPT).unwrap();
        let mut b = a.clone();

        a.advance(1, 1000.0).unwrap();
        b.advance(1, 1000.0).unwrap();

        assert_eq!(a.kinetics(1), b.kinetics(1));
        assert_eq!(a.equilibrium(1), b.equilibrium(1));

        // Kinetic moles decay, saturation indices relax toward zero.
        assert!(a.kinetics(1).unwrap().components[0].moles < 0.002);
        assert!(a.equilibrium(1).unwrap().phases[0].saturation_index < 0.5);
    }

    #[test]
    fn zero_step_advance_changes_nothing_without_surfaces() {
        let mut solver = ReferenceSolver::new();
        solver.run_script(SCRIPT).unwrap();
        let before = solver.dump_cell(1).unwrap();
        solver.advance(1, 0.0).unwrap();
        assert_eq!(solver.dump_cell(1).unwrap(), before);
    }

    #[test]
    fn advance_rejects_negative_steps_and_unknown_cells() {
        let mut solver = ReferenceSolver::new();
        solver.run_script(SCRIPT).unwrap();
        assert!(matches!(
            solver.advance(1, -1.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(solver.advance(9, 1.0), Err(Error::UnknownCell(9))));
    }

    #[test]
    fn surface_diffuse_layer_materializes_on_first_advance() {
        let script = "\
SOLUTION_RAW 1
    -temp 25
SURFACE_RAW 1
    -component Hfo_wOH
        -moles 0.0002
        -la -3.5
        -totals
            Hfo_wOH 0.0002
    -charge Hfo_w
        -area 600
        -grams 1
        -mass_water 1
END
";
        let mut solver = ReferenceSolver::new();
        solver.run_script(script).unwrap();
        assert!(solver.surface(1).unwrap().charges[0]
            .diffuse_layer_totals
            .is_empty());

        solver.advance(1, 0.0).unwrap();
        let dl = &solver.surface(1).unwrap().charges[0].diffuse_layer_totals;
        assert!(dl.get("H").is_some());
        assert!(dl.get("O").is_some());
    }

    #[test]
    fn knobs_block_overrides_defaults() {
        let mut solver = ReferenceSolver::new();
        solver
            .run_script("KNOBS\n    -iterations 250\n    -step_size 10\n    -diagonal_scale true\n")
            .unwrap();
        let knobs = solver.knobs();
        assert_eq!(knobs.max_iterations, 250);
        assert_eq!(knobs.step_size, 10.0);
        assert!(knobs.diagonal_scaling);
    }

    #[test]
    fn selected_output_produces_a_consistent_report() {
        let mut solver = ReferenceSolver::new();
        solver
            .run_script("SELECTED_OUTPUT\n    -headings pH Ca\nEND\n")
            .unwrap();
        let report = solver.selected_output_text().unwrap();
        let headings: Vec<&str> = report.lines().next().unwrap().split('\t').collect();
        let values: Vec<&str> = report.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(headings.len(), values.len());
    }
}
