mod deadline_test;
mod fan_in_test;
mod generator_test;
mod quit_test;
mod relay_test;
mod sequencer_test;
